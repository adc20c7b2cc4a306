//! Panic-button and humidity node.
//!
//! Three tasks share exactly two pieces of state:
//!
//! ```text
//!  ┌──────────────┐ set()  ┌────────────┐ read_and_clear() ┌───────────────┐
//!  │ButtonMonitor │───────▶│ PanicLatch │◀─────────────────│ DeviceServer  │
//!  └──────┬───────┘        └────────────┘                  │ (one conn at  │
//!         │ enqueue(3)                                      │  a time)      │
//!         ▼                                                 └──────┬────────┘
//!  ┌──────────────┐◀─────────────── enqueue(5) ─────────────────────┘
//!  │  BlinkQueue  │──▶ Signaler ──▶ LED
//!  └──────────────┘
//! ```
//!
//! The latch is guarded by one exclusive lock; the blink queue is bounded
//! and producers wait when it is full. Nothing else is shared.

pub mod api;
pub mod blink;
pub mod button;
pub mod config;
pub mod error;
pub mod hal;
pub mod http;
pub mod humidity;
pub mod latch;
pub mod server;

pub use api::{Handler, PanicApi};
pub use blink::{BlinkQueue, BlinkReceiver, Signaler};
pub use button::{ButtonEvent, ButtonMonitor, ButtonTiming};
pub use config::{DeviceConfig, DeviceVariant};
pub use error::{DeviceError, DeviceResult};
pub use hal::{
    Adc, Bootloader, InputLine, Led, LogLed, ProcessRestart, SimulatedAdc, SimulatedLine,
};
pub use humidity::HumidityApi;
pub use latch::PanicLatch;
pub use server::{DeviceServer, ServerSettings};
