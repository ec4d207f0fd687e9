use gtpu::{ErrorIndication, GtpTeid, GtpuError};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};

/// Sends GTP-U datagrams out of the local GTP-U endpoint.
pub trait GtpuTx: Send + Sync {
    /// Address to advertise in the GTP-U Peer Address IE, or None if it isn't known.
    fn local_address(&self) -> Option<IpAddr>;

    /// Best effort and non-blocking.
    fn send_to(&self, pdu: Vec<u8>, dst: SocketAddr);
}

/// Builds Error Indications with a shared, wrapping sequence number.
#[derive(Default)]
pub(crate) struct ErrorIndicationBuilder {
    seq_number: AtomicU16,
}

impl ErrorIndicationBuilder {
    pub fn build(&self, teid_i: GtpTeid, local_address: IpAddr) -> Result<Vec<u8>, GtpuError> {
        ErrorIndication {
            seq_number: self.seq_number.fetch_add(1, Ordering::Relaxed),
            teid_i,
            peer_address: local_address,
        }
        .encode()
    }
}
