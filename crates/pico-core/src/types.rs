//! JSON bodies exchanged between pico devices and exporters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Result of a clear-on-read `/panic` call.
///
/// `timestamp` is the instant the latch was *read*, not when it was set.
/// When `panic` is false the timestamp carries [`PanicStatus::zero_timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanicStatus {
    pub panic: bool,
    pub timestamp: DateTime<Utc>,
}

impl PanicStatus {
    /// Status for a read that observed the latch set at `read_at`.
    pub fn raised(read_at: DateTime<Utc>) -> Self {
        Self {
            panic: true,
            timestamp: read_at,
        }
    }

    /// Status for a read that observed a clear latch.
    pub fn quiet() -> Self {
        Self {
            panic: false,
            timestamp: Self::zero_timestamp(),
        }
    }

    /// `0001-01-01T00:00:00Z`, the timestamp reported alongside `panic: false`.
    ///
    /// Deployed consumers decode this exact value, so it is kept instead of
    /// the Unix epoch.
    pub fn zero_timestamp() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Whether the timestamp is the zero value.
    pub fn has_zero_timestamp(&self) -> bool {
        self.timestamp == Self::zero_timestamp()
    }
}

impl Default for PanicStatus {
    fn default() -> Self {
        Self::quiet()
    }
}

/// Liveness stub served at `/pulse`. Always `up: true` on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseStatus {
    pub up: bool,
}

impl PulseStatus {
    pub fn up() -> Self {
        Self { up: true }
    }
}

/// Raw ADC reading from the humidity node.
///
/// The device emits an unsigned 16-bit sample; exporters decode it as `f64`
/// so it can be exposed directly as a gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HumidityReading {
    pub value: f64,
}

impl HumidityReading {
    pub fn from_raw(raw: u16) -> Self {
        Self {
            value: f64::from(raw),
        }
    }
}

/// Number of LED toggles requested from the signaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkRequest(u32);

impl BlinkRequest {
    /// Toggles used when a request carries a count of zero.
    pub const DEFAULT_COUNT: u32 = 5;
    /// Feedback for a physical button press.
    pub const PRESS: BlinkRequest = BlinkRequest(3);
    /// Feedback after a serviced HTTP request.
    pub const SERVICED: BlinkRequest = BlinkRequest(5);

    pub fn new(count: u32) -> Self {
        Self(count)
    }

    /// Effective toggle count. Zero is normalised to [`Self::DEFAULT_COUNT`].
    pub fn count(&self) -> u32 {
        if self.0 == 0 {
            Self::DEFAULT_COUNT
        } else {
            self.0
        }
    }
}

/// Decode a JSON body, rejecting empty payloads with a clearer message than serde's EOF error.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CoreError::InvalidPayload("empty body".to_string()));
    }
    Ok(serde_json::from_slice(body)?)
}
