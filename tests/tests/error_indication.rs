use cu_up_tests::framework::*;
use gtpu::GtpTeid;
use std::net::IpAddr;

#[async_std::test]
async fn unknown_teid_gets_error_indication() -> anyhow::Result<()> {
    let (cu_up, peer, _logger) = init().await?;

    peer.send_g_pdu(GtpTeid(0xdead_0001), vec![], b"lost").await?;
    let ei = peer.recv_error_indication().await?;
    assert_eq!(ei.teid_i, GtpTeid(0xdead_0001));
    assert_eq!(ei.peer_address, "127.0.0.1".parse::<IpAddr>()?);

    peer.send_g_pdu(GtpTeid(0xdead_0002), vec![], b"lost").await?;
    let second = peer.recv_error_indication().await?;
    assert_eq!(second.teid_i, GtpTeid(0xdead_0002));
    assert_eq!(second.seq_number, ei.seq_number.wrapping_add(1));
    peer.expect_nothing().await?;

    assert_eq!(cu_up.stats().error_indications_sent, 2);
    cu_up.graceful_shutdown().await;
    Ok(())
}

#[async_std::test]
async fn malformed_datagram_is_dropped() -> anyhow::Result<()> {
    let (cu_up, peer, _logger) = init().await?;

    peer.send_raw(&[0x30, 0xff, 0x00]).await?;
    peer.send_raw(&[0x50, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07]).await?;
    peer.expect_nothing().await?;

    assert_eq!(cu_up.stats().drop_malformed, 2);
    cu_up.graceful_shutdown().await;
    Ok(())
}
