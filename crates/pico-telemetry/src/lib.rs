//! Structured logging and Prometheus self-metrics for pico processes.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Process-wide counters for fetches, cache refreshes, polls and webhooks
//! - Text exposition helper shared by exporter `/metrics` handlers

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{encode_families, Metrics};
