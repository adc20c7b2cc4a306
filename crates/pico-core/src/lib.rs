//! Core types for the pico panic and humidity nodes.
//!
//! This crate provides the pieces both sides of the wire agree on:
//! - `PanicStatus`, `PulseStatus`, `HumidityReading`: JSON bodies served by devices
//! - `BlinkRequest`: LED feedback request passed between device tasks
//! - `Clock`: time source abstraction used by caches and pollers
//! - `format_elapsed`: human-readable durations for alert payloads

pub mod clock;
pub mod elapsed;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use elapsed::format_elapsed;
pub use error::{CoreError, Result};
pub use types::{decode, BlinkRequest, HumidityReading, PanicStatus, PulseStatus};
