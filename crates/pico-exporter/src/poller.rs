//! Alert poller.
//!
//! Reads the clear-on-read `/panic` endpoint on a fixed interval with its own
//! fetcher (no cache) and sends one webhook per observed panic. Every failure
//! is logged and the loop waits for the next tick.

use std::sync::Arc;
use std::time::Duration;

use pico_core::{Clock, PanicStatus};
use pico_telemetry::Metrics;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::fetch::DynFetch;
use crate::webhook::{Notifier, PanicAlert};

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The device could not be read.
    FetchFailed,
    /// No panic since the last read.
    Quiet,
    /// Panic observed and webhook delivered.
    Alerted(PanicAlert),
    /// Panic observed but the webhook failed. The event is not retried.
    AlertFailed(PanicAlert),
}

impl PollOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::Quiet => "quiet",
            Self::Alerted(_) => "alerted",
            Self::AlertFailed(_) => "alert_failed",
        }
    }
}

pub struct AlertPoller {
    fetcher: DynFetch<PanicStatus>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl AlertPoller {
    pub fn new(
        fetcher: DynFetch<PanicStatus>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            clock,
            interval,
        }
    }

    /// Poll forever. The first check happens one interval after start.
    pub async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "Panic checker started");
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Run a single cycle.
    pub async fn poll_once(&self) -> PollOutcome {
        let outcome = self.check().await;
        Metrics::poll_cycle(outcome.label());
        outcome
    }

    async fn check(&self) -> PollOutcome {
        let status = match self.fetcher.fetch().await {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "Panic check failed");
                return PollOutcome::FetchFailed;
            }
        };

        if !status.panic {
            info!("No panic has occurred");
            return PollOutcome::Quiet;
        }

        let alert = PanicAlert::new(status.timestamp, self.clock.now());
        info!(time_ago = %alert.time_ago(), "Panic actioned, sending webhook");

        match self.notifier.notify(alert.clone()).await {
            Ok(()) => {
                Metrics::webhook_dispatch("delivered");
                PollOutcome::Alerted(alert)
            }
            Err(e) => {
                Metrics::webhook_dispatch(e.outcome());
                error!(error = %e, "Webhook dispatch failed");
                PollOutcome::AlertFailed(alert)
            }
        }
    }
}
