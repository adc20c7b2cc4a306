//! Pico panic exporter - Entry Point
//!
//! Serves `pico_up`/`pico_panic` gauges and polls the device for panics,
//! sending a webhook for each one observed.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pico_core::SystemClock;
use pico_exporter::{run_server, ExporterConfig, PanicExporter};
use tracing::info;

/// Pico panic button exporter
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PICO_EXPORTER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pico_telemetry::init_logging()?;

    info!("Starting pico panic exporter v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > PICO_EXPORTER_CONFIG env var > defaults; PICO_SERVER_URL always wins
    let config_path = args
        .config
        .or_else(|| std::env::var("PICO_EXPORTER_CONFIG").ok());
    let config = ExporterConfig::load(config_path.as_deref())?;
    info!(device_url = %config.device_url, port = config.listen_port, "Configuration loaded");

    let exporter = PanicExporter::build(&config, Arc::new(SystemClock))?;
    tokio::spawn(exporter.poller.run());

    run_server(config.listen_addr(), exporter.state).await?;

    Ok(())
}
