//! Prometheus self-metrics for pico processes.
//!
//! These describe the processes themselves (fetch outcomes, poll cycles,
//! webhook dispatches, device request routing). Device-derived gauges such as
//! `pico_up` live on each exporter's own registry instead.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::proto::MetricFamily;
use prometheus::{
    register_counter_vec, register_int_counter, CounterVec, Encoder, IntCounter, TextEncoder,
};

use crate::error::TelemetryResult;

/// Remote device fetches by endpoint and outcome.
/// Labels: endpoint (panic/pulse/humidity), outcome (ok/transport/status/decode)
pub static REMOTE_FETCH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_remote_fetch_total",
        "Total remote device fetches by outcome",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Cache refreshes (one per expired TTL window).
pub static CACHE_REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_cache_refresh_total",
        "Total cache refreshes after TTL expiry",
        &["endpoint"]
    )
    .unwrap()
});

/// Alert poll cycles by outcome.
/// Labels: outcome (fetch_failed/quiet/alerted/alert_failed)
pub static POLL_CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_poll_cycles_total",
        "Total alert poll cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Webhook dispatches by outcome.
/// Labels: outcome (delivered/rejected/transport)
pub static WEBHOOK_DISPATCH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_webhook_dispatch_total",
        "Total webhook dispatches by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Device requests served by route.
pub static DEVICE_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_device_requests_total",
        "Total device HTTP requests served by route",
        &["route"]
    )
    .unwrap()
});

/// Device connections abandoned before a response was written.
/// Labels: reason (deadline/read/parse/write)
pub static DEVICE_CONNECTIONS_ABANDONED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_device_connections_abandoned_total",
        "Total device connections abandoned",
        &["reason"]
    )
    .unwrap()
});

/// Latch set operations by source.
/// Labels: source (button/force)
pub static LATCH_SET_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pico_latch_set_total",
        "Total panic latch set operations",
        &["source"]
    )
    .unwrap()
});

/// Button press edges detected.
pub static BUTTON_PRESSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pico_button_presses_total", "Total button press edges").unwrap()
});

/// Long presses that triggered the bootloader.
pub static LONG_PRESSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pico_long_presses_total",
        "Total long presses that triggered the bootloader"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a remote fetch outcome.
    pub fn remote_fetch(endpoint: &str, outcome: &str) {
        REMOTE_FETCH_TOTAL
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Record a cache refresh.
    pub fn cache_refresh(endpoint: &str) {
        CACHE_REFRESH_TOTAL.with_label_values(&[endpoint]).inc();
    }

    /// Record a poll cycle outcome.
    pub fn poll_cycle(outcome: &str) {
        POLL_CYCLES_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a webhook dispatch outcome.
    pub fn webhook_dispatch(outcome: &str) {
        WEBHOOK_DISPATCH_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a served device request.
    pub fn device_request(route: &str) {
        DEVICE_REQUESTS_TOTAL.with_label_values(&[route]).inc();
    }

    /// Record an abandoned device connection.
    pub fn connection_abandoned(reason: &str) {
        DEVICE_CONNECTIONS_ABANDONED_TOTAL
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a latch set.
    pub fn latch_set(source: &str) {
        LATCH_SET_TOTAL.with_label_values(&[source]).inc();
    }

    /// Record a button press edge.
    pub fn button_pressed() {
        BUTTON_PRESSES_TOTAL.inc();
    }

    /// Record a long press.
    pub fn long_press() {
        LONG_PRESSES_TOTAL.inc();
    }

    /// Gather the process-wide default registry.
    pub fn gather() -> Vec<MetricFamily> {
        prometheus::gather()
    }
}

/// Encode metric families in the Prometheus text exposition format.
pub fn encode_families(families: &[MetricFamily]) -> TelemetryResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
