use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_QUEUE_SIZE: usize = 2048;
pub const DEFAULT_BATCH_SIZE: usize = 256;
pub const DEFAULT_TEST_TEID: u32 = 1;
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    // The F1-U / N3 IP address that GTP-U is served on.
    pub ip_addr: IpAddr,

    // UDP port.  2152 except in tests, which use 0 to get an ephemeral port.
    pub gtpu_port: u16,

    // Demux tuning and test flags.
    pub demux: DemuxConfig,

    // If set, PDUs delivered to tunnels are also written to this pcap file.
    pub pcap_file: Option<PathBuf>,

    // How often throughput and drop counters are logged.
    pub stats_interval: Duration,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DemuxConfig {
    // Depth of each tunnel's dispatch queue.
    pub queue_size: usize,

    // Maximum PDUs delivered by one dispatch task.
    pub batch_size: usize,

    // Log queue-full drops at warn rather than info.
    pub warn_on_drop: bool,

    // Ignore the TEID in the header and deliver everything to `test_teid`.
    pub test_mode: bool,
    pub test_teid: u32,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        DemuxConfig {
            queue_size: DEFAULT_QUEUE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            warn_on_drop: false,
            test_mode: false,
            test_teid: DEFAULT_TEST_TEID,
        }
    }
}

impl DemuxConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.queue_size > 0, "queue_size must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(
            !self.test_mode || self.test_teid != 0,
            "test_teid 0 is reserved for path management"
        );
        Ok(())
    }
}

/// Optional settings file.  Command line options override it.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub demux: DemuxConfig,
    pub pcap_file: Option<PathBuf>,
    pub stats_interval_secs: Option<u64>,
}

impl ConfigFile {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs.unwrap_or(DEFAULT_STATS_INTERVAL_SECS))
    }
}

pub fn load_config_file(path: &Path, logger: &Logger) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path).inspect_err(|e| {
        error!(
            logger,
            "Failed to read config file {} with error code {e}",
            path.display()
        )
    })?;
    let config_file = parse_config_file(&contents)
        .with_context(|| format!("Bad config file {}", path.display()))?;
    info!(logger, "Loaded {}", path.display());
    Ok(config_file)
}

fn parse_config_file(contents: &str) -> Result<ConfigFile> {
    let config_file: ConfigFile = toml::from_str(contents)?;
    config_file.demux.validate()?;
    ensure!(
        config_file.stats_interval_secs != Some(0),
        "stats_interval_secs must be at least 1"
    );
    Ok(config_file)
}
