use cu_up_tests::framework::*;
use gtpu::{EchoResponse, GtpTeid};

#[async_std::test]
async fn echo_request_is_answered() -> anyhow::Result<()> {
    let (cu_up, peer, _logger) = init().await?;

    peer.send_echo_request(0x1234).await?;
    assert_eq!(
        peer.recv_echo_response().await?,
        EchoResponse {
            seq_number: 0x1234,
            restart_counter: 0
        }
    );

    // A G-PDU on TEID 0 reaches path management, which ignores it.
    peer.send_g_pdu(GtpTeid(0), vec![], b"nothing").await?;
    peer.expect_nothing().await?;

    cu_up.graceful_shutdown().await;
    Ok(())
}
