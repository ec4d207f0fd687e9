//! main - starts a standalone CU-UP GTP-U endpoint

use anyhow::{Context, Result, ensure};
use async_std::channel::Sender;
use async_std::prelude::*;
use clap::Parser;
use cu_up::{Config, ConfigFile, CuUp, load_config_file};
use gtpu::GTPU_PORT;
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, o};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local IP address of the CU-UP.  GTP-U (F1-U / N3) is served on this address.
    /// Defaults to the eth0 address.
    #[arg(long)]
    local_ip: Option<IpAddr>,

    /// UDP port for GTP-U.
    #[arg(long, default_value_t = GTPU_PORT)]
    port: u16,

    /// TOML file with demux settings, capture file and statistics interval.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture PDUs delivered to bearers to this pcap file.  Overrides the config file.
    #[arg(long)]
    pcap_file: Option<PathBuf>,

    /// Loop all GTP-U traffic back to the sender, ignoring the TEID in the header.
    #[arg(long)]
    test_mode: bool,

    /// TEID of the loopback bearer in test mode.
    #[arg(long)]
    test_teid: Option<u32>,
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let local_ip = match args.local_ip {
        Some(ip) => ip,
        None => local_ip_address::local_ip()
            .context("Failed to find a local IP - use --local-ip")?,
    };
    check_local_ip(&local_ip)?;

    let mut config_file = match &args.config {
        Some(path) => load_config_file(path, &logger)?,
        None => ConfigFile::default(),
    };
    config_file.demux.test_mode |= args.test_mode;
    if let Some(test_teid) = args.test_teid {
        config_file.demux.test_teid = test_teid;
    }
    config_file.demux.validate()?;
    let stats_interval = config_file.stats_interval();

    let cu_up = CuUp::start(
        Config {
            ip_addr: local_ip,
            gtpu_port: args.port,
            demux: config_file.demux,
            pcap_file: args.pcap_file.or(config_file.pcap_file),
            stats_interval,
        },
        logger,
    )
    .await?;

    wait_for_signal().await?;
    cu_up.graceful_shutdown().await;

    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn check_local_ip(ip: &IpAddr) -> Result<()> {
    ensure!(
        !ip.is_unspecified(),
        "Unspecified IP address not allowed for local IP - this must be an address that peers can send to"
    );
    Ok(())
}

async fn wait_for_signal() -> Result<i32> {
    let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_std::channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));
    let signal = sig_receiver.recv().await;
    handle.close();
    signals_task.await;
    Ok(signal?)
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        match signal {
            SIGHUP => {
                // Nothing to reload yet
            }
            SIGTERM | SIGINT | SIGQUIT => {
                let _ = sig_sender.send(signal).await;
            }
            _ => unreachable!(),
        }
    }
}
