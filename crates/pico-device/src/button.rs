//! Button sampling: edge detection, long press and cooldown.
//!
//! The monitor is timer driven rather than interrupt driven. Each tick
//! samples the input line once and feeds the level into a small state
//! machine:
//!
//! ```text
//!   Idle ──active──▶ Held ──inactive──▶ Cooldown ──expired & inactive──▶ Idle
//!                     │
//!                     └─ held ≥ long_press ─▶ bootloader (once)
//! ```
//!
//! The latch is set on the press edge itself, so a panic is reported even
//! when the press is long enough to also restart the device.

use std::sync::Arc;
use std::time::Duration;

use pico_core::BlinkRequest;
use pico_telemetry::Metrics;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::blink::BlinkQueue;
use crate::hal::{Bootloader, InputLine};
use crate::latch::PanicLatch;

/// Button timing parameters.
#[derive(Debug, Clone, Copy)]
pub struct ButtonTiming {
    pub sample_interval: Duration,
    pub long_press: Duration,
    pub cooldown: Duration,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(200),
            long_press: Duration::from_secs(3),
            cooldown: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    Held { since: Instant, long_fired: bool },
    Cooldown { until: Instant },
}

/// What a single sample produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    None,
    Pressed,
    LongPress,
    Released,
}

/// Periodic sampler for the panic button.
pub struct ButtonMonitor<L: InputLine> {
    line: L,
    latch: Arc<PanicLatch>,
    blink: BlinkQueue,
    bootloader: Arc<dyn Bootloader>,
    timing: ButtonTiming,
    state: PressState,
}

impl<L: InputLine> ButtonMonitor<L> {
    pub fn new(
        line: L,
        latch: Arc<PanicLatch>,
        blink: BlinkQueue,
        bootloader: Arc<dyn Bootloader>,
        timing: ButtonTiming,
    ) -> Self {
        Self {
            line,
            latch,
            blink,
            bootloader,
            timing,
            state: PressState::Idle,
        }
    }

    /// Sample forever at the configured interval.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.timing.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.timing.sample_interval.as_millis() as u64,
            "Button monitor started"
        );

        loop {
            ticker.tick().await;
            self.step(Instant::now()).await;
        }
    }

    /// Sample the line once and apply the resulting event.
    pub async fn step(&mut self, now: Instant) -> ButtonEvent {
        let active = self.line.is_active();
        let event = self.on_sample(active, now);

        match event {
            ButtonEvent::Pressed => {
                info!("Button pushed...");
                Metrics::button_pressed();
                Metrics::latch_set("button");
                self.latch.set();
                self.blink.enqueue(BlinkRequest::PRESS).await;
            }
            ButtonEvent::LongPress => {
                Metrics::long_press();
                warn!(
                    held_ms = self.timing.long_press.as_millis() as u64,
                    "Long press detected"
                );
                self.bootloader.enter();
            }
            ButtonEvent::Released => debug!("Button released"),
            ButtonEvent::None => {}
        }

        event
    }

    /// Advance the state machine with one sample. No side effects.
    fn on_sample(&mut self, active: bool, now: Instant) -> ButtonEvent {
        match self.state {
            PressState::Idle if active => {
                self.state = PressState::Held {
                    since: now,
                    long_fired: false,
                };
                ButtonEvent::Pressed
            }
            PressState::Idle => ButtonEvent::None,
            PressState::Held { since, long_fired } if active => {
                if !long_fired && now.duration_since(since) >= self.timing.long_press {
                    self.state = PressState::Held {
                        since,
                        long_fired: true,
                    };
                    ButtonEvent::LongPress
                } else {
                    ButtonEvent::None
                }
            }
            PressState::Held { .. } => {
                self.state = PressState::Cooldown {
                    until: now + self.timing.cooldown,
                };
                ButtonEvent::Released
            }
            PressState::Cooldown { until } => {
                if now >= until && !active {
                    self.state = PressState::Idle;
                }
                ButtonEvent::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimulatedLine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingBootloader {
        entered: AtomicUsize,
    }

    impl Bootloader for RecordingBootloader {
        fn enter(&self) {
            self.entered.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        monitor: ButtonMonitor<SimulatedLine>,
        line: SimulatedLine,
        latch: Arc<PanicLatch>,
        boot: Arc<RecordingBootloader>,
        rx: crate::blink::BlinkReceiver,
    }

    fn fixture() -> Fixture {
        let line = SimulatedLine::new();
        let latch = Arc::new(PanicLatch::new());
        let boot = Arc::new(RecordingBootloader::default());
        let (blink, rx) = BlinkQueue::bounded(3);
        let monitor = ButtonMonitor::new(
            line.clone(),
            latch.clone(),
            blink,
            boot.clone(),
            ButtonTiming::default(),
        );
        Fixture {
            monitor,
            line,
            latch,
            boot,
            rx,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn test_idle_line_does_nothing() {
        let mut f = fixture();
        let t0 = Instant::now();
        for i in 0..10 {
            assert_eq!(f.monitor.step(t0 + ms(200 * i)).await, ButtonEvent::None);
        }
        assert!(!f.latch.is_set());
    }

    #[tokio::test]
    async fn test_press_edge_sets_latch_and_blinks() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        assert_eq!(f.monitor.step(t0).await, ButtonEvent::Pressed);
        assert!(f.latch.is_set());
        assert_eq!(f.rx.recv().await, Some(BlinkRequest::PRESS));
    }

    #[tokio::test]
    async fn test_held_line_is_one_press() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        assert_eq!(f.monitor.step(t0).await, ButtonEvent::Pressed);
        assert!(f.latch.read_and_clear());

        for i in 1..10 {
            assert_eq!(f.monitor.step(t0 + ms(200 * i)).await, ButtonEvent::None);
        }
        assert!(!f.latch.is_set());
    }

    #[tokio::test]
    async fn test_long_press_resamples_and_fires_once() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        f.monitor.step(t0).await;

        // Held but below threshold: re-sampled, nothing fires
        assert_eq!(f.monitor.step(t0 + ms(2_800)).await, ButtonEvent::None);
        assert_eq!(f.boot.entered.load(Ordering::SeqCst), 0);

        assert_eq!(f.monitor.step(t0 + ms(3_000)).await, ButtonEvent::LongPress);
        assert_eq!(f.monitor.step(t0 + ms(3_200)).await, ButtonEvent::None);
        assert_eq!(f.boot.entered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_press_never_enters_bootloader() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        f.monitor.step(t0).await;
        f.line.release();
        assert_eq!(f.monitor.step(t0 + ms(400)).await, ButtonEvent::Released);
        f.monitor.step(t0 + ms(5_000)).await;
        assert_eq!(f.boot.entered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_bounce() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        f.monitor.step(t0).await;
        f.line.release();
        f.monitor.step(t0 + ms(200)).await;
        assert!(f.latch.read_and_clear());
        assert_eq!(f.rx.recv().await, Some(BlinkRequest::PRESS));

        // Bounce inside the cooldown window
        f.line.press();
        assert_eq!(f.monitor.step(t0 + ms(400)).await, ButtonEvent::None);
        f.line.release();
        assert_eq!(f.monitor.step(t0 + ms(600)).await, ButtonEvent::None);
        assert!(!f.latch.is_set());

        // Cooldown over and line idle: back to Idle, next press counts
        assert_eq!(f.monitor.step(t0 + ms(1_200)).await, ButtonEvent::None);
        f.line.press();
        assert_eq!(f.monitor.step(t0 + ms(1_400)).await, ButtonEvent::Pressed);
        assert!(f.latch.is_set());
    }

    #[tokio::test]
    async fn test_press_held_through_cooldown_needs_release() {
        let mut f = fixture();
        let t0 = Instant::now();

        f.line.press();
        f.monitor.step(t0).await;
        f.line.release();
        f.monitor.step(t0 + ms(200)).await;
        assert!(f.latch.read_and_clear());

        f.line.press();
        assert_eq!(f.monitor.step(t0 + ms(1_400)).await, ButtonEvent::None);
        assert_eq!(f.monitor.step(t0 + ms(1_600)).await, ButtonEvent::None);
        assert!(!f.latch.is_set());

        f.line.release();
        f.monitor.step(t0 + ms(1_800)).await;
        f.line.press();
        assert_eq!(f.monitor.step(t0 + ms(2_000)).await, ButtonEvent::Pressed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_on_interval() {
        let f = fixture();
        let line = f.line.clone();
        let latch = f.latch.clone();
        let mut rx = f.rx;
        let handle = tokio::spawn(f.monitor.run());

        tokio::time::sleep(ms(500)).await;
        assert!(!latch.is_set());

        line.press();
        tokio::time::sleep(ms(300)).await;
        assert!(latch.is_set());
        assert_eq!(rx.recv().await, Some(BlinkRequest::PRESS));

        handle.abort();
    }
}
