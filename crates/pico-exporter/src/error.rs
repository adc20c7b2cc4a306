//! Exporter error types.

use thiserror::Error;

/// Failure fetching a device endpoint. Consumers treat every variant alike:
/// log, mark the value down and wait for the next tick.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] pico_core::CoreError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] pico_telemetry::TelemetryError),
}

impl ExporterError {
    /// Outcome label for fetch metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            _ => "other",
        }
    }
}

pub type ExporterResult<T> = Result<T, ExporterError>;

/// Failure delivering a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook failed with status {status} and body {body}")]
    Rejected { status: u16, body: String },

    #[error("webhook not configured")]
    NotConfigured,
}

impl WebhookError {
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::NotConfigured => "not_configured",
        }
    }
}
