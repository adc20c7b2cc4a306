//! Wiring of the two exporter processes.

use std::sync::Arc;

use pico_core::{Clock, HumidityReading, PanicStatus, PulseStatus};
use tracing::{info, warn};

use crate::cache::RemoteCache;
use crate::client::DeviceClient;
use crate::config::ExporterConfig;
use crate::error::ExporterResult;
use crate::poller::AlertPoller;
use crate::server::{AppState, HUMIDITY_INDEX, PANIC_INDEX};
use crate::surface::MetricsSurface;
use crate::webhook::WebhookNotifier;

/// Panic exporter: scrape surface plus the independent alert poller.
pub struct PanicExporter {
    pub state: AppState,
    pub poller: AlertPoller,
}

impl PanicExporter {
    pub fn build(config: &ExporterConfig, clock: Arc<dyn Clock>) -> ExporterResult<Self> {
        let timeout = config.http_timeout();

        let scrape_client = Arc::new(DeviceClient::new(&config.device_url, timeout)?);
        let pulse: Arc<RemoteCache<PulseStatus>> = Arc::new(RemoteCache::new(
            scrape_client.clone(),
            clock.clone(),
            config.cache_ttl(),
        ));
        let panic = if config.metrics.scrape_panic {
            info!("pico_panic gauge enabled, scrapes consume device panic events");
            Some(Arc::new(RemoteCache::<PanicStatus>::new(
                scrape_client,
                clock.clone(),
                config.cache_ttl(),
            )))
        } else {
            None
        };
        let surface = MetricsSurface::panic(pulse, panic)?;

        if !config.webhook.enabled() {
            warn!("Webhook URL not configured, panic alerts will only be logged");
        }
        let notifier = Arc::new(WebhookNotifier::new(config.webhook.clone(), timeout)?);
        // The poller reads /panic with a client of its own, never through the cache.
        let poll_client = Arc::new(DeviceClient::new(&config.device_url, timeout)?);
        let poller = AlertPoller::new(poll_client, notifier, clock, config.poll_interval());

        Ok(Self {
            state: AppState::new(Arc::new(surface), PANIC_INDEX),
            poller,
        })
    }
}

/// Humidity exporter: scrape surface only.
pub fn humidity_exporter(
    config: &ExporterConfig,
    clock: Arc<dyn Clock>,
) -> ExporterResult<AppState> {
    let client = Arc::new(DeviceClient::new(&config.device_url, config.http_timeout())?);
    let reading: Arc<RemoteCache<HumidityReading>> =
        Arc::new(RemoteCache::new(client, clock, config.cache_ttl()));
    let surface = MetricsSurface::humidity(reading)?;
    Ok(AppState::new(Arc::new(surface), HUMIDITY_INDEX))
}
