use crate::Config;
use crate::userplane::{
    DemuxStats, DispatchQueueHandle, GtpuDemux, PacketProcessor, TunnelRxNotifier,
};
use anyhow::Result;
use gtpu::GtpTeid;
use slog::{Logger, info};
use std::net::SocketAddr;
use std::sync::Weak;

/// The CU-UP user plane ingress: a GTP-U endpoint demultiplexing PDUs onto bearers.
pub struct CuUp {
    config: Config,
    packet_processor: PacketProcessor,
    logger: Logger,
}

impl CuUp {
    pub async fn start(config: Config, logger: Logger) -> Result<Self> {
        let packet_processor = PacketProcessor::new(&config, &logger).await?;
        info!(
            &logger,
            "CU-UP started on {} (queue size {}, batch size {})",
            packet_processor.local_addr(),
            config.demux.queue_size,
            config.demux.batch_size
        );
        Ok(CuUp {
            config,
            packet_processor,
            logger,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address and port that GTP-U is served on.
    pub fn local_addr(&self) -> SocketAddr {
        self.packet_processor.local_addr()
    }

    pub fn demux(&self) -> &GtpuDemux {
        self.packet_processor.demux()
    }

    pub fn stats(&self) -> DemuxStats {
        self.packet_processor.stats()
    }

    pub fn loopback_count(&self) -> Option<usize> {
        self.packet_processor.loopback_count()
    }

    pub async fn create_bearer(
        &self,
        notifier: Weak<dyn TunnelRxNotifier>,
    ) -> Result<DispatchQueueHandle> {
        self.packet_processor.create_bearer(notifier).await
    }

    pub async fn delete_bearer(&self, teid: GtpTeid) -> bool {
        self.packet_processor.delete_bearer(teid).await
    }

    pub async fn graceful_shutdown(self) {
        info!(&self.logger, "Shutting down");
        self.packet_processor.graceful_shutdown().await;
    }
}
