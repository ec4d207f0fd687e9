//! path_management - GTP-U signalling received on TEID 0 (TS29.281, 7.2 and 7.3)

use super::error_indication::GtpuTx;
use super::tunnel_registry::TunnelRxNotifier;
use gtpu::{EchoRequest, EchoResponse, ErrorIndication, GtpuHeader, GtpuMessageType};
use slog::{Logger, debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

// We never restart without losing all tunnels, so there is no restart counter to report.
const RESTART_COUNTER: u8 = 0;

pub struct PathManagement {
    tx: Arc<dyn GtpuTx>,
    logger: Logger,
}

impl PathManagement {
    pub fn new(tx: Arc<dyn GtpuTx>, logger: Logger) -> Self {
        PathManagement { tx, logger }
    }

    fn handle_echo_request(&self, pdu: &[u8], src: SocketAddr) {
        let request = match EchoRequest::decode(pdu) {
            Ok(request) => request,
            Err(e) => {
                warn!(self.logger, "Bad Echo Request from {src} - {e}");
                return;
            }
        };
        debug!(self.logger, "Echo Request {} from {src}", request.seq_number);
        let response = EchoResponse {
            seq_number: request.seq_number,
            restart_counter: RESTART_COUNTER,
        };
        match response.encode() {
            Ok(response) => self.tx.send_to(response, src),
            Err(e) => warn!(self.logger, "Failed to encode Echo Response - {e}"),
        }
    }
}

impl TunnelRxNotifier for PathManagement {
    fn on_new_pdu(&self, pdu: Vec<u8>, src: SocketAddr) {
        let header = match GtpuHeader::unpack(&pdu) {
            Ok((header, _)) => header,
            Err(e) => {
                warn!(self.logger, "Bad path management message from {src} - {e}");
                return;
            }
        };
        match header.message_type {
            GtpuMessageType::EchoRequest => self.handle_echo_request(&pdu, src),
            GtpuMessageType::EchoResponse => {
                debug!(self.logger, "Echo Response {} from {src}", header.seq_number)
            }
            GtpuMessageType::ErrorIndication => match ErrorIndication::decode(&pdu) {
                Ok(ei) => warn!(
                    self.logger,
                    "Error Indication from {} for TEID {}", ei.peer_address, ei.teid_i
                ),
                Err(e) => warn!(self.logger, "Bad Error Indication from {src} - {e}"),
            },
            other => info!(self.logger, "Ignoring {other:?} on TEID 0 from {src}"),
        }
    }
}
