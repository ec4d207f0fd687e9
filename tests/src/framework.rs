use super::MockPeer;
use anyhow::Result;
use cu_up::{Config, CuUp, DemuxConfig};
use slog::{Drain, Logger, o};
use std::path::PathBuf;
use std::time::Duration;

const CU_UP_IP: &str = "127.0.0.1";

pub async fn init() -> Result<(CuUp, MockPeer, Logger)> {
    init_with(DemuxConfig::default(), None).await
}

/// Start a CU-UP on an ephemeral port plus a mock peer to talk to it.
pub async fn init_with(
    demux: DemuxConfig,
    pcap_file: Option<PathBuf>,
) -> Result<(CuUp, MockPeer, Logger)> {
    exit_on_panic();
    let logger = init_logging();
    let cu_up = start_cu_up(demux, pcap_file, &logger).await?;
    let peer = MockPeer::new(CU_UP_IP, cu_up.local_addr(), logger.new(o!("peer" => 1))).await?;
    Ok((cu_up, peer, logger))
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

async fn start_cu_up(
    demux: DemuxConfig,
    pcap_file: Option<PathBuf>,
    logger: &Logger,
) -> Result<CuUp> {
    CuUp::start(
        Config {
            ip_addr: CU_UP_IP.parse()?,
            gtpu_port: 0,
            demux,
            pcap_file,
            stats_interval: Duration::from_secs(1),
        },
        logger.new(o!("cu-up" => 1)),
    )
    .await
}
