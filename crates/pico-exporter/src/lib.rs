//! Exporters for pico devices.
//!
//! Two independent consumers read the same clear-on-read device endpoint:
//!
//! - [`RemoteCache`] + [`MetricsSurface`]: scrape-time gauges, one fetch per TTL window
//! - [`AlertPoller`]: fixed-interval check, one webhook per observed panic
//!
//! They are not synchronized with each other.

pub mod app;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod poller;
pub mod server;
pub mod surface;
pub mod webhook;

pub use app::{humidity_exporter, PanicExporter};
pub use cache::{RemoteCache, Snapshot};
pub use client::DeviceClient;
pub use config::{ExporterConfig, MetricsConfig, WebhookConfig};
pub use error::{ExporterError, ExporterResult, WebhookError};
pub use fetch::{BoxFuture, DynFetch, Fetch, MockFetch};
pub use poller::{AlertPoller, PollOutcome};
pub use server::{create_router, run_server, serve, AppState};
pub use surface::MetricsSurface;
pub use webhook::{MockNotifier, Notifier, PanicAlert, WebhookNotifier};
