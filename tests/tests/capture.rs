use cu_up::DemuxConfig;
use cu_up_tests::{MockBearer, framework::*};

const PCAP_GLOBAL_HEADER_LEN: u64 = 24;
const PCAP_RECORD_HEADER_LEN: u64 = 16;
const IPV4_UDP_HEADER_LEN: u64 = 28;

#[async_std::test]
async fn delivered_pdus_are_captured() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("cu-up-test-{}.pcap", rand::random::<u32>()));
    let (cu_up, peer, _logger) = init_with(DemuxConfig::default(), Some(path.clone())).await?;
    let bearer = MockBearer::new();
    let teid = cu_up.create_bearer(bearer.notifier()).await?.teid();

    let pdu = peer.send_g_pdu(teid, vec![], b"capture me").await?;
    bearer.recv().await?;

    // Not delivered to a bearer, so not captured.
    peer.send_g_pdu(gtpu::GtpTeid(teid.0 ^ 0xffff_0000), vec![], b"unknown").await?;
    peer.recv_error_indication().await?;

    cu_up.graceful_shutdown().await;

    let len = std::fs::metadata(&path)?.len();
    std::fs::remove_file(&path)?;
    assert_eq!(
        len,
        PCAP_GLOBAL_HEADER_LEN + PCAP_RECORD_HEADER_LEN + IPV4_UDP_HEADER_LEN + pdu.len() as u64
    );
    Ok(())
}
