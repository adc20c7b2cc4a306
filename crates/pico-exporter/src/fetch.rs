//! Remote fetch abstraction.
//!
//! Caches and the alert poller depend on [`Fetch`] rather than on the HTTP
//! client directly, so they can be driven by [`MockFetch`] in tests.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ExporterError, ExporterResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// One remote endpoint returning `T`.
pub trait Fetch<T>: Send + Sync {
    /// Fetch the current value. No retries.
    fn fetch(&self) -> BoxFuture<'_, ExporterResult<T>>;

    /// Endpoint label for logs and metrics.
    fn endpoint(&self) -> &'static str;
}

/// Arc wrapper for Fetch trait objects.
pub type DynFetch<T> = Arc<dyn Fetch<T>>;

/// Scripted fetcher for testing.
///
/// Each call pops the next scripted reply; once the script is exhausted the
/// last reply repeats. `None` replies fail with a 503 status error.
#[derive(Debug)]
pub struct MockFetch<T> {
    endpoint: &'static str,
    script: parking_lot::Mutex<VecDeque<Option<T>>>,
    last: parking_lot::Mutex<Option<T>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Clone> MockFetch<T> {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            script: parking_lot::Mutex::new(VecDeque::new()),
            last: parking_lot::Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay every reply, to hold concurrent callers inside a refresh.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a successful reply.
    pub fn push_ok(&self, value: T) {
        self.script.lock().push_back(Some(value));
    }

    /// Queue a failing reply.
    pub fn push_err(&self) {
        self.script.lock().push_back(None);
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<T> {
        let mut last = self.last.lock();
        if let Some(reply) = self.script.lock().pop_front() {
            *last = reply;
        }
        last.clone()
    }
}

impl<T: Clone + Send + Sync> Fetch<T> for MockFetch<T> {
    fn fetch(&self) -> BoxFuture<'_, ExporterResult<T>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.next_reply().ok_or_else(|| ExporterError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        })
    }

    fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_script_then_repeats_last() {
        let mock = MockFetch::new("pulse");
        mock.push_ok(1u32);
        mock.push_err();
        mock.push_ok(2);

        assert_eq!(mock.fetch().await.unwrap(), 1);
        assert!(matches!(
            mock.fetch().await,
            Err(ExporterError::Status { status: 503, .. })
        ));
        assert_eq!(mock.fetch().await.unwrap(), 2);
        assert_eq!(mock.fetch().await.unwrap(), 2);
        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_mock_fails() {
        let mock: MockFetch<u32> = MockFetch::new("panic");
        assert!(mock.fetch().await.is_err());
        assert_eq!(mock.endpoint(), "panic");
    }
}
