//! Time-boxed cache over a remote endpoint.
//!
//! Concurrent scrapes share one cached value per TTL window. Reads take the
//! shared lock; a refresh takes the exclusive lock, re-checks expiry and
//! performs exactly one fetch while the other callers wait for its result.

use std::sync::Arc;
use std::time::Duration;

use pico_core::Clock;
use pico_telemetry::Metrics;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::fetch::DynFetch;

/// Default cache lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2);

/// Value returned by [`RemoteCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub value: T,
    /// False when the last refresh failed. `value` is then the default.
    pub up: bool,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    up: bool,
    /// Clock reading (ms) after which the entry is stale. Zero = never filled.
    expires_at_ms: u64,
}

impl<T> Entry<T> {
    fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// Cache over one device endpoint.
pub struct RemoteCache<T> {
    fetcher: DynFetch<T>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: RwLock<Entry<T>>,
}

impl<T> RemoteCache<T>
where
    T: Clone + Default + Send + Sync,
{
    pub fn new(fetcher: DynFetch<T>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            fetcher,
            clock,
            ttl,
            entry: RwLock::new(Entry {
                value: T::default(),
                up: false,
                expires_at_ms: 0,
            }),
        }
    }

    /// Current value, refreshing it if the window has expired.
    ///
    /// Never fails: a failed refresh yields `up = false` and the default value
    /// until the next window.
    pub async fn get(&self) -> Snapshot<T> {
        {
            let entry = self.entry.read().await;
            if entry.is_fresh(self.clock.now_ms()) {
                return Snapshot {
                    value: entry.value.clone(),
                    up: entry.up,
                };
            }
        }

        let mut entry = self.entry.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if !entry.is_fresh(self.clock.now_ms()) {
            let endpoint = self.fetcher.endpoint();
            Metrics::cache_refresh(endpoint);
            match self.fetcher.fetch().await {
                Ok(value) => {
                    debug!(endpoint, "Cache refreshed");
                    entry.value = value;
                    entry.up = true;
                }
                Err(e) => {
                    warn!(endpoint, error = %e, "Cache refresh failed, marking down");
                    entry.value = T::default();
                    entry.up = false;
                }
            }
            entry.expires_at_ms = self.clock.now_ms().saturating_add(self.ttl.as_millis() as u64);
        }

        Snapshot {
            value: entry.value.clone(),
            up: entry.up,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetch;
    use pico_core::{ManualClock, PulseStatus};

    const BASE_TIME: u64 = 1_727_289_000_000;

    fn cache_with(
        mock: Arc<MockFetch<PulseStatus>>,
        clock: &ManualClock,
    ) -> Arc<RemoteCache<PulseStatus>> {
        Arc::new(RemoteCache::new(mock, Arc::new(clock.clone()), DEFAULT_TTL))
    }

    #[tokio::test]
    async fn test_no_fetch_within_window() {
        let clock = ManualClock::new(BASE_TIME);
        let mock = Arc::new(MockFetch::new("pulse"));
        mock.push_ok(PulseStatus::up());
        let cache = cache_with(mock.clone(), &clock);

        assert!(cache.get().await.up);
        clock.advance_ms(1_999);
        assert!(cache.get().await.up);
        assert_eq!(mock.calls(), 1);

        clock.advance_ms(1);
        assert!(cache.get().await.up);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let clock = ManualClock::new(BASE_TIME);
        let mock = Arc::new(MockFetch::new("pulse").with_delay(Duration::from_millis(50)));
        mock.push_ok(PulseStatus::up());
        let cache = cache_with(mock.clone(), &clock);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await }));
        }
        for handle in handles {
            let snapshot = handle.await.unwrap();
            assert!(snapshot.up);
            assert_eq!(snapshot.value, PulseStatus::up());
        }
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_marks_down_and_resets_value() {
        let clock = ManualClock::new(BASE_TIME);
        let mock = Arc::new(MockFetch::new("pulse"));
        mock.push_ok(PulseStatus::up());
        mock.push_err();
        let cache = cache_with(mock.clone(), &clock);

        assert_eq!(
            cache.get().await,
            Snapshot {
                value: PulseStatus::up(),
                up: true
            }
        );

        clock.advance_ms(2_000);
        assert_eq!(
            cache.get().await,
            Snapshot {
                value: PulseStatus::default(),
                up: false
            }
        );

        // Down is cached for the window too.
        assert!(!cache.get().await.up);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_starts_expired() {
        let clock = ManualClock::new(0);
        let mock = Arc::new(MockFetch::new("pulse"));
        let cache = cache_with(mock.clone(), &clock);

        assert!(!cache.get().await.up);
        assert_eq!(mock.calls(), 1);
    }
}
