//! Pitlane capture CLI
//!
//! # Usage
//!
//! ```bash
//! # Listen on 20777 and flush to the local InfluxDB once per second
//! pitlane
//!
//! # Custom port and half-second flushes
//! pitlane --port 20778 --interval 0.5
//!
//! # Load settings from a file, override the port, skip the database
//! pitlane --config pitlane.yaml -p 20777 --dry-run
//! ```
//!
//! Press Enter (or Ctrl-C) to stop.

use anyhow::{Context, Result};
use clap::Parser;
use pitlane::{CaptureConfig, MemorySink, Pitlane};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pitlane")]
#[command(about = "Capture F1 2019 UDP telemetry into InfluxDB", long_about = None)]
struct Args {
    /// UDP port to listen on [default: 20777]
    #[arg(short, long)]
    port: Option<u16>,

    /// Flush interval in seconds [default: 1.0]
    #[arg(short, long)]
    interval: Option<f64>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Decode and count records without writing to InfluxDB
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn load_config(&self) -> Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::from_yaml_file(path)?,
            None => CaptureConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let args = Args::parse();
    let config = args.load_config().context("loading configuration")?;

    let dry_run_sink = args.dry_run.then(|| Arc::new(MemorySink::discarding()));
    let capture = match &dry_run_sink {
        Some(sink) => {
            info!("Dry run: records are counted, not written");
            Pitlane::start_with_sink(&config, sink.clone())
        }
        None => Pitlane::start(&config),
    };
    let capture = match capture {
        Ok(capture) => capture,
        Err(e) => {
            for suggestion in e.recovery_suggestions() {
                warn!("  - {}", suggestion);
            }
            return Err(e).context("starting capture");
        }
    };

    info!(addr = %capture.local_addr(), "Capturing, press Enter to stop");
    wait_for_stop().await;

    let stats = capture.shutdown().await.context("stopping capture")?;
    info!(
        flushes = stats.flushes,
        packets = stats.packets,
        records = stats.records,
        too_short = stats.rejected.too_short,
        unrecognized = stats.rejected.unrecognized,
        size_mismatch = stats.rejected.size_mismatch,
        failed_writes = stats.failed_writes,
        "Capture finished"
    );
    if let Some(sink) = dry_run_sink {
        info!(records = sink.accepted_records(), "Dry run accepted records");
    }
    Ok(())
}

/// Resolve on a line from stdin or Ctrl-C; a closed stdin leaves only Ctrl-C
async fn wait_for_stop() {
    let console = async {
        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(n) if n > 0 => {}
            _ => std::future::pending::<()>().await,
        }
    };

    let signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = console => info!("Stop requested from console"),
        _ = signal => info!("Stop requested by signal"),
    }
}
