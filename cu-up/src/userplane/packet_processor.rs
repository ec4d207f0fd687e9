use super::counters::dump_stats;
use super::dispatch_queue::DispatchQueueHandle;
use super::gateway::{UdpGateway, spawn_ingress};
use super::loopback::LoopbackBearer;
use super::path_management::PathManagement;
use super::pcap::{GtpuPcapWriter, NullPcapWriter, PcapWriter};
use super::tunnel_registry::TunnelRxNotifier;
use super::{DemuxStats, GtpuDemux};
use crate::Config;
use crate::executor::{AsyncStdExecutor, TaskExecutor};
use anyhow::{Result, bail};
use async_std::sync::Mutex;
use async_std::task::JoinHandle;
use dashmap::DashMap;
use gtpu::{GTPU_PATH_MANAGEMENT_TEID, GtpTeid};
use index_pool::IndexPool;
use slog::{Logger, info, o, warn};
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use stop_token::StopSource;

// Bearer TEIDs carry the pool index in the bottom 16 bits.
const MAX_BEARERS: usize = 0xffff;

/// Owns the GTP-U endpoint, the demux and the tasks that drive them.
pub struct PacketProcessor {
    gateway: Arc<UdpGateway>,
    demux: GtpuDemux,
    executor: Arc<dyn TaskExecutor>,
    index_pool: Mutex<IndexPool>,
    bearers: DashMap<GtpTeid, usize>,
    _path_management: Arc<PathManagement>,
    loopback: Option<Arc<LoopbackBearer>>,
    pcap_writer: Option<Arc<GtpuPcapWriter>>,
    stop_source: StopSource,
    tasks: Vec<JoinHandle<()>>,
    logger: Logger,
}

impl PacketProcessor {
    pub async fn new(config: &Config, logger: &Logger) -> Result<Self> {
        config.demux.validate()?;

        let gateway = Arc::new(UdpGateway::bind(config.ip_addr, config.gtpu_port, logger)?);
        let mut tasks = vec![];

        let (pcap_writer, pcap_sink) = match &config.pcap_file {
            Some(path) => {
                let (writer, task) = GtpuPcapWriter::create(path, logger).await?;
                tasks.push(task);
                (Some(writer.clone()), writer as Arc<dyn PcapWriter>)
            }
            None => (None, Arc::new(NullPcapWriter) as Arc<dyn PcapWriter>),
        };

        let demux = GtpuDemux::new(config.demux.clone(), pcap_sink, logger.clone())?;
        demux.set_error_indication_tx(gateway.clone());
        let executor: Arc<dyn TaskExecutor> = Arc::new(AsyncStdExecutor);

        // Echo and Error Indication arrive on TEID 0.
        let path_management = Arc::new(PathManagement::new(gateway.clone(), logger.clone()));
        let weak_path_management: Weak<PathManagement> = Arc::downgrade(&path_management);
        demux.add_tunnel(
            GTPU_PATH_MANAGEMENT_TEID,
            executor.clone(),
            weak_path_management,
        )?;

        let loopback = if config.demux.test_mode {
            let teid = GtpTeid(config.demux.test_teid);
            let loopback = Arc::new(LoopbackBearer::new(
                teid,
                gateway.clone(),
                logger.new(o!("teid" => teid.to_string())),
            ));
            let weak_loopback: Weak<LoopbackBearer> = Arc::downgrade(&loopback);
            demux.add_tunnel(teid, executor.clone(), weak_loopback)?;
            demux.apply_test_teid(teid)?;
            warn!(logger, "Test mode - all GTP-U traffic is looped back on TEID {teid}");
            Some(loopback)
        } else {
            None
        };

        let stop_source = StopSource::new();
        tasks.push(spawn_ingress(
            gateway.ingress_socket()?,
            demux.clone(),
            stop_source.token(),
            logger.clone(),
        ));
        tasks.push(async_std::task::spawn(dump_stats(
            logger.clone(),
            demux.counters(),
            config.stats_interval,
            stop_source.token(),
        )));

        let mut index_pool = IndexPool::new();
        // Take the 0 slot, so that no bearer TEID is 0.
        let _ = index_pool.request_id(0);

        Ok(PacketProcessor {
            gateway,
            demux,
            executor,
            index_pool: Mutex::new(index_pool),
            bearers: DashMap::new(),
            _path_management: path_management,
            loopback,
            pcap_writer,
            stop_source,
            tasks,
            logger: logger.clone(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.gateway.local_socket_addr()
    }

    pub fn demux(&self) -> &GtpuDemux {
        &self.demux
    }

    pub fn stats(&self) -> DemuxStats {
        self.demux.stats()
    }

    /// PDUs reflected by the test mode loopback bearer.
    pub fn loopback_count(&self) -> Option<usize> {
        self.loopback.as_ref().map(|loopback| loopback.reflected())
    }

    /// Allocate a TEID and route its PDUs to `notifier`.
    pub async fn create_bearer(
        &self,
        notifier: Weak<dyn TunnelRxNotifier>,
    ) -> Result<DispatchQueueHandle> {
        let idx = self.index_pool.lock().await.new_id();
        if idx > MAX_BEARERS {
            self.release_index(idx).await;
            bail!("No more bearer TEIDs available");
        }

        // Randomize the top part of the TEID.  It is meant to be unpredictable.
        let teid = GtpTeid(((rand::random::<u16>() as u32) << 16) | idx as u32);

        match self.demux.add_tunnel(teid, self.executor.clone(), notifier) {
            Ok(handle) => {
                self.bearers.insert(teid, idx);
                info!(self.logger, "Created bearer {teid}");
                Ok(handle)
            }
            Err(e) => {
                self.release_index(idx).await;
                Err(e.into())
            }
        }
    }

    /// Returns false if `teid` is not a bearer created by [`PacketProcessor::create_bearer`].
    pub async fn delete_bearer(&self, teid: GtpTeid) -> bool {
        let Some((_, idx)) = self.bearers.remove(&teid) else {
            warn!(self.logger, "Delete of unknown bearer {teid}");
            return false;
        };
        self.demux.remove_tunnel(teid);
        self.release_index(idx).await;
        info!(self.logger, "Deleted bearer {teid}");
        true
    }

    async fn release_index(&self, idx: usize) {
        if self.index_pool.lock().await.return_id(idx).is_err() {
            warn!(self.logger, "Bearer index {idx} was already free");
        }
    }

    pub async fn graceful_shutdown(self) {
        self.demux.stop();
        drop(self.stop_source);
        if let Some(pcap_writer) = &self.pcap_writer {
            pcap_writer.close();
        }
        for task in self.tasks {
            task.await;
        }
        info!(self.logger, "Userplane stopped - {:?}", self.demux.stats());
    }
}
