use super::dispatch_queue::DispatchQueue;
use dashmap::DashMap;
use derive_deref::Deref;
use gtpu::GtpTeid;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};

/// The layer above the demux that consumes a tunnel's PDUs (PDCP, SDAP, or a test double).
pub trait TunnelRxNotifier: Send + Sync {
    /// Takes ownership of the whole GTP-U datagram.
    fn on_new_pdu(&self, pdu: Vec<u8>, src: SocketAddr);
}

pub(crate) struct TunnelContext {
    pub queue: Arc<DispatchQueue>,
    pub notifier: Weak<dyn TunnelRxNotifier>,
}

/// TEID to tunnel map.  Shard locks are held for a lookup, insert or erase and nothing else.
#[derive(Deref, Default)]
pub(crate) struct TunnelRegistry(DashMap<GtpTeid, TunnelContext>);
