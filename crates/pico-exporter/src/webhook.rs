//! Outbound panic alert webhook.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pico_core::format_elapsed;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::WebhookConfig;
use crate::error::{ExporterError, ExporterResult, WebhookError};
use crate::fetch::BoxFuture;

/// A panic observed by the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PanicAlert {
    /// Instant the device reported for the read that observed the panic.
    pub observed_at: DateTime<Utc>,
    /// Time between `observed_at` and dispatch.
    pub elapsed: Duration,
}

impl PanicAlert {
    /// Alert for a device timestamp, measured against `now`.
    ///
    /// A device clock ahead of ours yields zero elapsed time.
    pub fn new(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let elapsed = (now - observed_at).to_std().unwrap_or_default();
        Self {
            observed_at,
            elapsed,
        }
    }

    /// Human-readable elapsed time, e.g. `1m5s`.
    pub fn time_ago(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Alert delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: PanicAlert) -> BoxFuture<'_, Result<(), WebhookError>>;
}

/// Posts a Discord-style JSON payload to the configured URL.
pub struct WebhookNotifier {
    client: Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig, timeout: Duration) -> ExporterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExporterError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Build the request body for `alert`.
    ///
    /// Empty optional URLs are left out rather than sent as `""`.
    pub fn payload(&self, alert: &PanicAlert) -> Value {
        let c = &self.config;

        let mut footer = json!({ "text": c.footer });
        if let Some(icon) = non_empty(&c.footer_icon_url) {
            footer["icon_url"] = json!(icon);
        }

        let mut embed = json!({
            "title": c.title,
            "description": c.description,
            "color": c.color,
            "timestamp": alert.observed_at.to_rfc3339(),
            "fields": [
                { "name": "Time Ago", "value": alert.time_ago(), "inline": true },
                { "name": "Actions", "value": c.actions, "inline": true },
            ],
            "footer": footer,
        });
        if let Some(name) = non_empty(&c.author_name) {
            let mut author = json!({ "name": name });
            if let Some(icon) = non_empty(&c.author_icon_url) {
                author["icon_url"] = json!(icon);
            }
            embed["author"] = author;
        }

        let mut payload = json!({
            "username": c.username,
            "content": c.content,
            "embeds": [embed],
        });
        if !c.avatar_url.is_empty() {
            payload["avatar_url"] = json!(c.avatar_url);
        }
        payload
    }

    async fn post(&self, alert: PanicAlert) -> Result<(), WebhookError> {
        if !self.config.enabled() {
            return Err(WebhookError::NotConfigured);
        }

        info!(time_ago = %alert.time_ago(), "Sending panic webhook");
        let response = self
            .client
            .post(&self.config.url)
            .json(&self.payload(&alert))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() > 299 {
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook delivered");
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, alert: PanicAlert) -> BoxFuture<'_, Result<(), WebhookError>> {
        Box::pin(self.post(alert))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Mock notifier for testing.
#[derive(Debug, Default)]
pub struct MockNotifier {
    /// Recorded alerts for verification.
    alerts: parking_lot::Mutex<Vec<PanicAlert>>,
    /// Reject every alert with this status when set.
    reject_with: parking_lot::Mutex<Option<u16>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_with(&self, status: u16) {
        *self.reject_with.lock() = Some(status);
    }

    pub fn alerts(&self) -> Vec<PanicAlert> {
        self.alerts.lock().clone()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, alert: PanicAlert) -> BoxFuture<'_, Result<(), WebhookError>> {
        Box::pin(async move {
            self.alerts.lock().push(alert);
            match *self.reject_with.lock() {
                Some(status) => Err(WebhookError::Rejected {
                    status,
                    body: String::new(),
                }),
                None => Ok(()),
            }
        })
    }
}
