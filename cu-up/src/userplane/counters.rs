use atomic_counter::{AtomicCounter, RelaxedCounter};
use slog::{Logger, info, warn};
use std::sync::Arc;
use std::time::Duration;
use stop_token::StopToken;
use stop_token::prelude::*;

#[derive(Default, Debug)]
pub struct DemuxCounters {
    pub rx_pdus: RelaxedCounter,
    pub rx_bytes: RelaxedCounter,
    pub delivered_pdus: RelaxedCounter,
    pub error_indications_sent: RelaxedCounter,
    pub drop_stopped: RelaxedCounter,
    pub drop_malformed: RelaxedCounter,
    pub drop_unknown_teid: RelaxedCounter,
    pub drop_queue_full: RelaxedCounter,
    pub drop_tunnel_gone: RelaxedCounter,
    pub pcap_copy_failures: RelaxedCounter,
}

/// Point in time copy of [`DemuxCounters`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxStats {
    pub rx_pdus: usize,
    pub rx_bytes: usize,
    pub delivered_pdus: usize,
    pub error_indications_sent: usize,
    pub drop_stopped: usize,
    pub drop_malformed: usize,
    pub drop_unknown_teid: usize,
    pub drop_queue_full: usize,
    pub drop_tunnel_gone: usize,
    pub pcap_copy_failures: usize,
}

impl DemuxStats {
    fn drops(&self) -> [usize; 6] {
        [
            self.drop_stopped,
            self.drop_malformed,
            self.drop_unknown_teid,
            self.drop_queue_full,
            self.drop_tunnel_gone,
            self.pcap_copy_failures,
        ]
    }
}

impl DemuxCounters {
    pub fn snapshot(&self) -> DemuxStats {
        DemuxStats {
            rx_pdus: self.rx_pdus.get(),
            rx_bytes: self.rx_bytes.get(),
            delivered_pdus: self.delivered_pdus.get(),
            error_indications_sent: self.error_indications_sent.get(),
            drop_stopped: self.drop_stopped.get(),
            drop_malformed: self.drop_malformed.get(),
            drop_unknown_teid: self.drop_unknown_teid.get(),
            drop_queue_full: self.drop_queue_full.get(),
            drop_tunnel_gone: self.drop_tunnel_gone.get(),
            pcap_copy_failures: self.pcap_copy_failures.get(),
        }
    }
}

/// Log throughput, and drops when they change, every `interval` until `stop_token` fires.
pub async fn dump_stats(
    logger: Logger,
    counters: Arc<DemuxCounters>,
    interval: Duration,
    stop_token: StopToken,
) {
    let mut last = DemuxStats::default();
    while async_std::task::sleep(interval)
        .timeout_at(stop_token.clone())
        .await
        .is_ok()
    {
        let now = counters.snapshot();
        if now.rx_pdus != last.rx_pdus {
            info!(
                &logger,
                "RX pkts={} bytes={} delivered={} error_ind={}",
                now.rx_pdus,
                now.rx_bytes,
                now.delivered_pdus,
                now.error_indications_sent
            );
        }
        if now.drops() != last.drops() {
            warn!(
                &logger,
                "DROPS stopped={} malformed={} unknown_teid={} queue_full={} tunnel_gone={} pcap_copy={}",
                now.drop_stopped,
                now.drop_malformed,
                now.drop_unknown_teid,
                now.drop_queue_full,
                now.drop_tunnel_gone,
                now.pcap_copy_failures
            );
        }
        last = now;
    }
}
