//! Pico device node - Entry Point
//!
//! Runs the panic button (or humidity sensor) on a host. The button line and
//! ADC are simulated and driven from stdin:
//!
//! - `press` / `release` set the button level
//! - `adc <raw>` sets the next humidity sample

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pico_core::SystemClock;
use pico_device::{
    BlinkQueue, ButtonMonitor, DeviceConfig, DeviceServer, DeviceVariant, HumidityApi, LogLed,
    PanicApi, PanicLatch, ProcessRestart, Signaler, SimulatedAdc, SimulatedLine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Pico panic button / humidity node
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PICO_DEVICE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pico_telemetry::init_logging()?;

    info!("Starting pico device v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > PICO_DEVICE_CONFIG env var > built-in defaults
    let config_path = args
        .config
        .or_else(|| std::env::var("PICO_DEVICE_CONFIG").ok());
    let mut config = DeviceConfig::load(config_path.as_deref())?;
    if let Some(port) = args.port {
        config.listen_port = port;
    }
    info!(?config.variant, port = config.listen_port, "Configuration loaded");

    let (blink, requests) = BlinkQueue::bounded(config.blink_queue_capacity);
    let signaler = Signaler::new(Arc::new(LogLed::new()), requests, config.blink_toggle_delay());
    tokio::spawn(signaler.run());

    let settings = config.server_settings();
    let addr = config.listen_addr();

    match config.variant {
        DeviceVariant::Panic => {
            let latch = Arc::new(PanicLatch::new());
            let bootloader = Arc::new(ProcessRestart);
            let line = SimulatedLine::new();

            let monitor = ButtonMonitor::new(
                line.clone(),
                latch.clone(),
                blink.clone(),
                bootloader.clone(),
                config.button_timing(),
            );
            tokio::spawn(monitor.run());
            tokio::spawn(console(line, None));

            let api = PanicApi::new(latch, bootloader, Arc::new(SystemClock));
            DeviceServer::bind(addr, api, blink, settings).await?.run().await;
        }
        DeviceVariant::Humidity => {
            let adc = Arc::new(SimulatedAdc::new(config.adc_initial));
            tokio::spawn(console(SimulatedLine::new(), Some(adc.clone())));

            let api = HumidityApi::new(adc);
            DeviceServer::bind(addr, api, blink, settings).await?.run().await;
        }
    }

    Ok(())
}

/// Drive the simulated peripherals from stdin.
async fn console(line: SimulatedLine, adc: Option<Arc<SimulatedAdc>>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = match lines.next_line().await {
            Ok(Some(input)) => input,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                return;
            }
        };

        let mut words = input.split_whitespace();
        match (words.next(), words.next()) {
            (Some("press"), _) => line.press(),
            (Some("release"), _) => line.release(),
            (Some("adc"), Some(raw)) => match (adc.as_ref(), raw.parse::<u16>()) {
                (Some(adc), Ok(raw)) => adc.set(raw),
                (None, _) => warn!("No ADC on this variant"),
                (_, Err(e)) => warn!(error = %e, "Invalid ADC sample"),
            },
            (None, _) => {}
            (Some(other), _) => warn!(command = other, "Unknown command"),
        }
    }
}
