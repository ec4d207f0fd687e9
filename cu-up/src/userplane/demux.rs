//! demux - routes inbound GTP-U datagrams to per-tunnel dispatch queues by TEID
//!
//! The ingress task calls [`GtpuDemux::handle_pdu`], which never blocks: the PDU is either
//! queued on its tunnel's dispatch queue or dropped.  The queue later runs
//! `handle_pdu_impl` on the tunnel's executor, which looks the tunnel up again, since it may
//! have been removed in the meantime, and hands the PDU to the tunnel's notifier.

use super::counters::{DemuxCounters, DemuxStats};
use super::dispatch_queue::{DispatchQueue, DispatchQueueHandle, PduContext};
use super::error_indication::{ErrorIndicationBuilder, GtpuTx};
use super::pcap::PcapWriter;
use super::tunnel_registry::{TunnelContext, TunnelRegistry, TunnelRxNotifier};
use crate::DemuxConfig;
use crate::executor::TaskExecutor;
use atomic_counter::AtomicCounter;
use dashmap::mapref::entry::Entry;
use gtpu::{GTPU_PATH_MANAGEMENT_TEID, GtpTeid, read_teid};
use slog::{Logger, debug, error, info, warn};
use std::collections::TryReserveError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DemuxError {
    #[error("TEID {0} already has a tunnel")]
    DuplicateTeid(GtpTeid),

    #[error("invalid demux configuration: {0}")]
    InvalidConfig(String),

    #[error("TEID {0} is reserved for path management")]
    ReservedTeid(GtpTeid),
}

// Octets of a malformed datagram included in the error log.
const MALFORMED_LOG_BYTES: usize = 16;

struct DemuxInner {
    config: DemuxConfig,
    registry: TunnelRegistry,
    stopped: AtomicBool,
    test_teid: AtomicU32,
    error_indication_tx: OnceLock<Arc<dyn GtpuTx>>,
    error_indications: ErrorIndicationBuilder,
    pcap_writer: Arc<dyn PcapWriter>,
    counters: Arc<DemuxCounters>,
    logger: Logger,
}

#[derive(Clone)]
pub struct GtpuDemux(Arc<DemuxInner>);

impl GtpuDemux {
    pub fn new(
        config: DemuxConfig,
        pcap_writer: Arc<dyn PcapWriter>,
        logger: Logger,
    ) -> Result<Self, DemuxError> {
        config
            .validate()
            .map_err(|e| DemuxError::InvalidConfig(e.to_string()))?;
        let test_teid = config.test_teid;
        Ok(GtpuDemux(Arc::new(DemuxInner {
            config,
            registry: TunnelRegistry::default(),
            stopped: AtomicBool::new(false),
            test_teid: AtomicU32::new(test_teid),
            error_indication_tx: OnceLock::new(),
            error_indications: ErrorIndicationBuilder::default(),
            pcap_writer,
            counters: Arc::new(DemuxCounters::default()),
            logger,
        })))
    }

    /// Install the transmitter used for Error Indications.  Only the first call has an effect.
    pub fn set_error_indication_tx(&self, tx: Arc<dyn GtpuTx>) {
        if self.0.error_indication_tx.set(tx).is_err() {
            warn!(
                self.0.logger,
                "Error Indication transmitter already set - ignoring"
            );
        }
    }

    /// Force all inbound traffic to `teid` while test mode is configured.
    pub fn apply_test_teid(&self, teid: GtpTeid) -> Result<(), DemuxError> {
        if teid == GTPU_PATH_MANAGEMENT_TEID {
            error!(self.0.logger, "Test mode TEID {teid} refused");
            return Err(DemuxError::ReservedTeid(teid));
        }
        self.0.test_teid.store(teid.0, Ordering::Relaxed);
        info!(self.0.logger, "Test mode TEID set to {teid}");
        Ok(())
    }

    pub fn add_tunnel(
        &self,
        teid: GtpTeid,
        executor: Arc<dyn TaskExecutor>,
        notifier: Weak<dyn TunnelRxNotifier>,
    ) -> Result<DispatchQueueHandle, DemuxError> {
        match self.0.registry.entry(teid) {
            Entry::Occupied(_) => {
                error!(self.0.logger, "Tunnel with TEID {teid} already exists");
                Err(DemuxError::DuplicateTeid(teid))
            }
            Entry::Vacant(entry) => {
                let demux = Arc::downgrade(&self.0);
                let queue = DispatchQueue::new(
                    self.0.config.queue_size,
                    self.0.config.batch_size,
                    executor,
                    Box::new(move |pdu_ctx| {
                        if let Some(demux) = demux.upgrade() {
                            demux.handle_pdu_impl(teid, pdu_ctx);
                        }
                    }),
                );
                let handle = queue.handle(teid);
                entry.insert(TunnelContext { queue, notifier });
                debug!(self.0.logger, "Added tunnel {teid}");
                Ok(handle)
            }
        }
    }

    /// Returns false if there was no such tunnel.  PDUs already queued for it are dropped.
    pub fn remove_tunnel(&self, teid: GtpTeid) -> bool {
        if self.0.registry.remove(&teid).is_some() {
            debug!(self.0.logger, "Removed tunnel {teid}");
            true
        } else {
            info!(self.0.logger, "No tunnel {teid} to remove");
            false
        }
    }

    /// Drop everything from now on, including PDUs already queued.
    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::Relaxed);
        info!(self.0.logger, "GTP-U demux stopped");
    }

    pub fn nof_tunnels(&self) -> usize {
        self.0.registry.len()
    }

    pub fn counters(&self) -> Arc<DemuxCounters> {
        self.0.counters.clone()
    }

    pub fn stats(&self) -> DemuxStats {
        self.0.counters.snapshot()
    }

    /// Classify a datagram and queue it on its tunnel.  Called from the ingress task.
    pub fn handle_pdu(&self, pdu: Vec<u8>, src: SocketAddr) {
        let inner = &self.0;
        if inner.stopped.load(Ordering::Relaxed) {
            inner.counters.drop_stopped.inc();
            return;
        }
        inner.counters.rx_pdus.inc();
        inner.counters.rx_bytes.add(pdu.len());

        let teid = if inner.config.test_mode {
            GtpTeid(inner.test_teid.load(Ordering::Relaxed))
        } else {
            match read_teid(&pdu) {
                Ok(teid) => teid,
                Err(e) => {
                    inner.counters.drop_malformed.inc();
                    error!(
                        inner.logger,
                        "Dropped {} byte datagram from {src} - {e}",
                        pdu.len();
                        "head" => hex::encode(&pdu[..pdu.len().min(MALFORMED_LOG_BYTES)])
                    );
                    return;
                }
            }
        };

        // Clone the queue out so that the shard lock is not held during the push.
        let queue = inner.registry.get(&teid).map(|ctx| ctx.queue.clone());
        let Some(queue) = queue else {
            inner.handle_unknown_teid(teid, src);
            return;
        };
        if !queue.try_push(PduContext { pdu, src }) {
            inner.counters.drop_queue_full.inc();
            if inner.config.warn_on_drop {
                warn!(inner.logger, "Dispatch queue full for TEID {teid} - dropped PDU");
            } else {
                info!(inner.logger, "Dispatch queue full for TEID {teid} - dropped PDU");
            }
        }
    }
}

impl DemuxInner {
    fn handle_unknown_teid(&self, teid: GtpTeid, src: SocketAddr) {
        self.counters.drop_unknown_teid.inc();

        // Never answer a miss on the path management TEID, or two nodes could ping-pong.
        if teid == GTPU_PATH_MANAGEMENT_TEID {
            return;
        }
        let Some(tx) = self.error_indication_tx.get() else {
            return;
        };
        let Some(local_address) = tx.local_address() else {
            error!(
                self.logger,
                "No local GTP-U address - not sending Error Indication for TEID {teid} to {src}"
            );
            return;
        };
        match self.error_indications.build(teid, local_address) {
            Ok(pdu) => {
                debug!(self.logger, "Unknown TEID {teid} - send Error Indication to {src}");
                self.counters.error_indications_sent.inc();
                tx.send_to(pdu, src);
            }
            Err(e) => error!(self.logger, "Failed to encode Error Indication - {e}"),
        }
    }

    fn handle_pdu_impl(&self, teid: GtpTeid, pdu_ctx: PduContext) {
        if self.stopped.load(Ordering::Relaxed) {
            self.counters.drop_stopped.inc();
            return;
        }

        let notifier = self.registry.get(&teid).map(|ctx| ctx.notifier.clone());
        let Some(notifier) = notifier else {
            self.counters.drop_tunnel_gone.inc();
            info!(self.logger, "Tunnel {teid} removed before PDU dispatch - dropped");
            return;
        };
        let Some(notifier) = notifier.upgrade() else {
            self.counters.drop_tunnel_gone.inc();
            info!(self.logger, "Receiver for tunnel {teid} has gone - dropped PDU");
            return;
        };

        if self.pcap_writer.is_write_enabled() {
            match deep_copy(&pdu_ctx.pdu) {
                Ok(copy) => self.pcap_writer.push_pdu(copy),
                Err(e) => {
                    self.counters.pcap_copy_failures.inc();
                    error!(self.logger, "Failed to copy PDU for capture - {e}");
                }
            }
        }

        self.counters.delivered_pdus.inc();
        notifier.on_new_pdu(pdu_ctx.pdu, pdu_ctx.src);
    }
}

fn deep_copy(pdu: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(pdu.len())?;
    copy.extend_from_slice(pdu);
    Ok(copy)
}
