//! HTTP client for the device API.

use std::time::Duration;

use pico_core::{HumidityReading, PanicStatus, PulseStatus};
use pico_telemetry::Metrics;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ExporterError, ExporterResult};
use crate::fetch::{BoxFuture, Fetch};

/// Default timeout for device requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one device. Every request carries the configured timeout.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: String,
}

impl DeviceClient {
    /// Create a client for the device at `base_url` (e.g. `http://10.0.0.7`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ExporterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExporterError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /panic`. Clears the device latch.
    pub async fn fetch_panic(&self) -> ExporterResult<PanicStatus> {
        self.get_json("panic", "/panic").await
    }

    /// `GET /pulse`.
    pub async fn fetch_pulse(&self) -> ExporterResult<PulseStatus> {
        self.get_json("pulse", "/pulse").await
    }

    /// `GET /` on a humidity node.
    pub async fn fetch_humidity(&self) -> ExporterResult<HumidityReading> {
        self.get_json("humidity", "/").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> ExporterResult<T> {
        let result = self.request(path).await;
        match &result {
            Ok(_) => Metrics::remote_fetch(endpoint, "ok"),
            Err(e) => {
                Metrics::remote_fetch(endpoint, e.outcome());
                warn!(endpoint, error = %e, "Device fetch failed");
            }
        }
        result
    }

    async fn request<T: DeserializeOwned>(&self, path: &str) -> ExporterResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fetching from device");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ExporterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(pico_core::decode(&body)?)
    }
}

impl Fetch<PanicStatus> for DeviceClient {
    fn fetch(&self) -> BoxFuture<'_, ExporterResult<PanicStatus>> {
        Box::pin(self.fetch_panic())
    }

    fn endpoint(&self) -> &'static str {
        "panic"
    }
}

impl Fetch<PulseStatus> for DeviceClient {
    fn fetch(&self) -> BoxFuture<'_, ExporterResult<PulseStatus>> {
        Box::pin(self.fetch_pulse())
    }

    fn endpoint(&self) -> &'static str {
        "pulse"
    }
}

impl Fetch<HumidityReading> for DeviceClient {
    fn fetch(&self) -> BoxFuture<'_, ExporterResult<HumidityReading>> {
        Box::pin(self.fetch_humidity())
    }

    fn endpoint(&self) -> &'static str {
        "humidity"
    }
}
