use cu_up_tests::{MockBearer, framework::*, ue_ipv4_udp_packet};
use gtpu::{ExtensionHeader, ExtensionHeaderType, GtpTeid, GtpuHeader};
use psup::{PsupPacking, PsupUlPduSessionInformation};
use std::net::Ipv4Addr;

#[async_std::test]
async fn bearer_lifecycle() -> anyhow::Result<()> {
    let (cu_up, peer, logger) = init().await?;
    let bearer = MockBearer::new();
    let handle = cu_up.create_bearer(bearer.notifier()).await?;
    let teid = handle.teid();
    assert_ne!(teid, GtpTeid(0));
    assert_eq!(handle.capacity(), 2048);

    // Uplink user data with a PDU session container, as from a UPF-facing DU.
    let mut container = vec![];
    PsupPacking::new(logger.clone()).pack(
        &mut container,
        &PsupUlPduSessionInformation {
            qos_flow_id: 9,
            ..Default::default()
        },
    )?;
    let ext = ExtensionHeader::new(ExtensionHeaderType::PDU_SESSION_CONTAINER, container);

    let mut sent = vec![];
    let ue_ip = Ipv4Addr::new(10, 255, 0, 1);
    let server_ip = Ipv4Addr::new(8, 8, 8, 8);
    for data in 0..3 {
        let payload = ue_ipv4_udp_packet(ue_ip, server_ip, data);
        sent.push(peer.send_g_pdu(teid, vec![ext.clone()], &payload).await?);
    }
    for expected in sent {
        let (pdu, src) = bearer.recv().await?;
        assert_eq!(pdu, expected);
        assert_eq!(src, peer.local_addr()?);
        let (header, _) = GtpuHeader::unpack(&pdu)?;
        assert!(header.extension(ExtensionHeaderType::PDU_SESSION_CONTAINER).is_some());
    }
    assert_eq!(handle.pushed(), 3);
    assert_eq!(handle.dropped(), 0);

    assert!(cu_up.delete_bearer(teid).await);
    assert!(!cu_up.delete_bearer(teid).await);

    peer.send_g_pdu(teid, vec![], b"late").await?;
    assert_eq!(peer.recv_error_indication().await?.teid_i, teid);
    bearer.expect_nothing().await?;

    cu_up.graceful_shutdown().await;
    Ok(())
}

#[async_std::test]
async fn bearers_get_distinct_teids() -> anyhow::Result<()> {
    let (cu_up, peer, _logger) = init().await?;
    let first = MockBearer::new();
    let second = MockBearer::new();
    let first_teid = cu_up.create_bearer(first.notifier()).await?.teid();
    let second_teid = cu_up.create_bearer(second.notifier()).await?.teid();
    assert_ne!(first_teid, second_teid);

    peer.send_g_pdu(second_teid, vec![], b"two").await?;
    peer.send_g_pdu(first_teid, vec![], b"one").await?;
    assert_eq!(&first.recv().await?.0[8..], b"one");
    assert_eq!(&second.recv().await?.0[8..], b"two");

    // Dropping the bearer's owner before deleting the TEID loses PDUs, nothing more.
    drop(second);
    peer.send_g_pdu(second_teid, vec![], b"gone").await?;
    peer.expect_nothing().await?;
    assert_eq!(cu_up.stats().drop_tunnel_gone, 1);

    cu_up.graceful_shutdown().await;
    Ok(())
}
