use cu_up::DemuxConfig;
use cu_up_tests::framework::*;
use gtpu::{ExtensionHeaderType, GtpTeid, GtpuHeader, GtpuMessageType};
use nrup::{NrupPacking, NruDlUserData};

#[async_std::test]
async fn everything_is_looped_back() -> anyhow::Result<()> {
    let (cu_up, peer, logger) = init_with(
        DemuxConfig {
            test_mode: true,
            test_teid: 0x77,
            ..Default::default()
        },
        None,
    )
    .await?;
    let nrup = NrupPacking::new(logger);

    // The TEID in the header is ignored in test mode.
    for (sn, teid) in [0x1234u32, 0x77].into_iter().enumerate() {
        peer.send_g_pdu(GtpTeid(teid), vec![], b"ping").await?;
        let pdu = peer.recv().await?;
        let (header, offset) = GtpuHeader::unpack(&pdu)?;
        assert_eq!(header.message_type, GtpuMessageType::GPdu);
        assert_eq!(header.teid, GtpTeid(0x77));
        assert_eq!(&pdu[offset..], b"ping");

        let Some(ext) = header.extension(ExtensionHeaderType::NR_RAN_CONTAINER) else {
            anyhow::bail!("No NR RAN container");
        };
        let dl_user_data: NruDlUserData = nrup.unpack(&ext.container)?;
        assert_eq!(dl_user_data.nru_sn, sn as u32);
    }
    assert_eq!(cu_up.loopback_count(), Some(2));

    cu_up.graceful_shutdown().await;
    Ok(())
}
