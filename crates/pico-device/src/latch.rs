//! Panic latch: single-bit memory of a button edge.

use parking_lot::Mutex;
use tracing::debug;

/// Edge latch consumed by clear-on-read.
///
/// Behaves as a depth-1 consume-once queue: any number of `set` calls before
/// a read collapse into one `true` observation, and every read clears it.
///
/// `set` and `read_and_clear` share one exclusive lock so the
/// check-then-clear is a single step. Exactly one reader observes `true`
/// for a given edge; readers serialized after it observe `false` until the
/// latch is set again.
///
/// # Example
/// ```
/// use pico_device::PanicLatch;
///
/// let latch = PanicLatch::new();
/// latch.set();
/// assert!(latch.read_and_clear());
/// assert!(!latch.read_and_clear());
/// ```
#[derive(Debug, Default)]
pub struct PanicLatch {
    set: Mutex<bool>,
}

impl PanicLatch {
    /// Create a clear latch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            set: Mutex::new(false),
        }
    }

    /// Set the latch. Idempotent.
    pub fn set(&self) {
        let mut set = self.set.lock();
        if !*set {
            debug!("Panic latch set");
        }
        *set = true;
    }

    /// Return the current value and clear the latch, whatever it was.
    #[must_use = "the observed value is lost once the latch is cleared"]
    pub fn read_and_clear(&self) -> bool {
        std::mem::replace(&mut *self.set.lock(), false)
    }

    /// Current value without clearing. Diagnostics only; never serve this.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }
}
