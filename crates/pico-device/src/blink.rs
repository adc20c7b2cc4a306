//! LED feedback: bounded request queue and its single consumer.

use std::sync::Arc;
use std::time::Duration;

use pico_core::BlinkRequest;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::hal::Led;

/// Producer side of the blink queue.
///
/// Full-queue policy: `enqueue` waits for a free slot, it never drops a
/// request. Callers see this as bounded latency while the signaler drains.
#[derive(Debug, Clone)]
pub struct BlinkQueue {
    tx: mpsc::Sender<BlinkRequest>,
}

/// Consumer side of the blink queue, handed to a [`Signaler`].
#[derive(Debug)]
pub struct BlinkReceiver {
    rx: mpsc::Receiver<BlinkRequest>,
}

impl BlinkQueue {
    /// Create a queue holding at most `capacity` pending requests.
    pub fn bounded(capacity: usize) -> (Self, BlinkReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, BlinkReceiver { rx })
    }

    /// Enqueue a request, waiting while the queue is full.
    ///
    /// A closed queue (signaler gone) is logged and otherwise ignored.
    pub async fn enqueue(&self, request: BlinkRequest) {
        if self.tx.send(request).await.is_err() {
            warn!(count = request.count(), "Blink queue closed, request dropped");
        }
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

impl BlinkReceiver {
    pub async fn recv(&mut self) -> Option<BlinkRequest> {
        self.rx.recv().await
    }
}

/// Sole owner of the LED. Drains blink requests one at a time.
pub struct Signaler {
    led: Arc<dyn Led>,
    requests: BlinkReceiver,
    toggle_delay: Duration,
}

impl Signaler {
    pub fn new(led: Arc<dyn Led>, requests: BlinkReceiver, toggle_delay: Duration) -> Self {
        Self {
            led,
            requests,
            toggle_delay,
        }
    }

    /// Run until every producer is dropped.
    pub async fn run(mut self) {
        self.set_led(true);
        while let Some(request) = self.requests.recv().await {
            self.signal(request).await;
        }
        debug!("Blink queue closed, signaler stopping");
    }

    /// Toggle the LED `request.count()` times starting from on, then leave it on.
    pub async fn signal(&self, request: BlinkRequest) {
        let mut on = true;
        for _ in 0..request.count() {
            on = !on;
            self.set_led(on);
            tokio::time::sleep(self.toggle_delay).await;
        }
        self.set_led(true);
    }

    fn set_led(&self, on: bool) {
        if let Err(e) = self.led.set(on) {
            error!(error = %e, "Failed to change LED state");
        }
    }
}
