//! loopback - a bearer that echoes G-PDU payloads back to the sender, for test mode
//!
//! Each reflected PDU carries an NR RAN container with a DL USER DATA frame and an
//! incrementing NR-U sequence number, as a CU-UP would send towards the DU.

use super::error_indication::GtpuTx;
use super::tunnel_registry::TunnelRxNotifier;
use atomic_counter::{AtomicCounter, RelaxedCounter};
use gtpu::{ExtensionHeader, ExtensionHeaderType, GtpTeid, GtpuHeader, GtpuMessageType, encode_pdu};
use nrup::{NrupPacking, NrupPduType, NruDlDataDeliveryStatus, NruDlUserData};
use psup::{
    PsupDlPduSessionInformation, PsupPacking, PsupPduType, PsupUlPduSessionInformation,
};
use slog::{Logger, debug, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

const NRU_SN_MASK: u32 = 0x00ff_ffff;

pub struct LoopbackBearer {
    teid: GtpTeid,
    tx: Arc<dyn GtpuTx>,
    nrup: NrupPacking,
    psup: PsupPacking,
    next_nru_sn: AtomicU32,
    reflected: RelaxedCounter,
    logger: Logger,
}

impl LoopbackBearer {
    pub fn new(teid: GtpTeid, tx: Arc<dyn GtpuTx>, logger: Logger) -> Self {
        LoopbackBearer {
            teid,
            tx,
            nrup: NrupPacking::new(logger.clone()),
            psup: PsupPacking::new(logger.clone()),
            next_nru_sn: AtomicU32::new(0),
            reflected: RelaxedCounter::new(0),
            logger,
        }
    }

    pub fn reflected(&self) -> usize {
        self.reflected.get()
    }

    fn log_nr_ran_container(&self, container: &[u8]) {
        match self.nrup.get_pdu_type(container) {
            Ok(NrupPduType::DlUserData) => {
                if let Ok(frame) = self.nrup.unpack::<NruDlUserData>(container) {
                    debug!(self.logger, "NR-U DL USER DATA sn={}", frame.nru_sn);
                }
            }
            Ok(NrupPduType::DlDataDeliveryStatus) => {
                if let Ok(frame) = self.nrup.unpack::<NruDlDataDeliveryStatus>(container) {
                    debug!(
                        self.logger,
                        "NR-U DL DATA DELIVERY STATUS buffer={} highest delivered={:?}",
                        frame.desired_buffer_size,
                        frame.highest_delivered_pdcp_sn
                    );
                }
            }
            Ok(other) => debug!(self.logger, "NR-U {other:?} not decoded"),
            Err(e) => warn!(self.logger, "Bad NR RAN container - {e}"),
        }
    }

    fn log_pdu_session_container(&self, container: &[u8]) {
        match self.psup.get_pdu_type(container) {
            Ok(PsupPduType::UlPduSessionInformation) => {
                if let Ok(info) = self.psup.unpack::<PsupUlPduSessionInformation>(container) {
                    debug!(self.logger, "UL PDU SESSION INFORMATION qfi={}", info.qos_flow_id);
                }
            }
            Ok(PsupPduType::DlPduSessionInformation) => {
                if let Ok(info) = self.psup.unpack::<PsupDlPduSessionInformation>(container) {
                    debug!(self.logger, "DL PDU SESSION INFORMATION qfi={}", info.qos_flow_id);
                }
            }
            Err(e) => warn!(self.logger, "Bad PDU session container - {e}"),
        }
    }

    fn reflect(&self, payload: &[u8], dst: SocketAddr) {
        let nru_sn = self.next_nru_sn.fetch_add(1, Ordering::Relaxed) & NRU_SN_MASK;
        let mut container = vec![];
        let dl_user_data = NruDlUserData {
            nru_sn,
            ..Default::default()
        };
        if self.nrup.pack(&mut container, &dl_user_data).is_err() {
            return;
        }
        let header = GtpuHeader::g_pdu(
            self.teid,
            vec![ExtensionHeader::new(
                ExtensionHeaderType::NR_RAN_CONTAINER,
                container,
            )],
        );
        match encode_pdu(header, payload) {
            Ok(pdu) => {
                self.reflected.inc();
                self.tx.send_to(pdu, dst);
            }
            Err(e) => warn!(self.logger, "Failed to encode loopback G-PDU - {e}"),
        }
    }
}

impl TunnelRxNotifier for LoopbackBearer {
    fn on_new_pdu(&self, pdu: Vec<u8>, src: SocketAddr) {
        let (header, payload_offset) = match GtpuHeader::unpack(&pdu) {
            Ok(x) => x,
            Err(e) => {
                warn!(self.logger, "Loopback dropped PDU from {src} - {e}");
                return;
            }
        };
        if header.message_type != GtpuMessageType::GPdu {
            debug!(self.logger, "Loopback ignoring {:?}", header.message_type);
            return;
        }
        if let Some(ext) = header.extension(ExtensionHeaderType::NR_RAN_CONTAINER) {
            self.log_nr_ran_container(&ext.container);
        }
        if let Some(ext) = header.extension(ExtensionHeaderType::PDU_SESSION_CONTAINER) {
            self.log_pdu_session_container(&ext.container);
        }
        self.reflect(&pdu[payload_offset..], src);
    }
}
