//! Pico humidity exporter - Entry Point

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pico_core::SystemClock;
use pico_exporter::{humidity_exporter, run_server, ExporterConfig};
use tracing::info;

/// Pico humidity sensor exporter
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

    info!("Starting pico humidity exporter v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("PICO_EXPORTER_CONFIG").ok());
    let config = ExporterConfig::load(config_path.as_deref())?;
    info!(device_url = %config.device_url, port = config.listen_port, "Configuration loaded");

    let state = humidity_exporter(&config, Arc::new(SystemClock))?;
    run_server(config.listen_addr(), state).await?;

    Ok(())
}
