//! Hardware seams for the device tasks.
//!
//! On the board these are a GPIO input, the Wi-Fi chip's LED pin, an ADC
//! channel and the ROM bootloader. Host builds use the simulated versions
//! below so the same tasks run unchanged.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::DeviceResult;

/// Digital input sampled by the button monitor.
pub trait InputLine: Send + Sync {
    /// Whether the line currently reads active (button held).
    fn is_active(&self) -> bool;
}

/// Status LED driven by the signaler.
pub trait Led: Send + Sync {
    fn set(&self, on: bool) -> DeviceResult<()>;
}

/// Irreversible restart into the bootloader.
pub trait Bootloader: Send + Sync {
    fn enter(&self);
}

/// Analog input read by the humidity variant.
pub trait Adc: Send + Sync {
    fn read(&self) -> u16;
}

/// Input line whose level is set programmatically. Clones share the level.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLine {
    active: Arc<AtomicBool>,
}

impl SimulatedLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl InputLine for SimulatedLine {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// LED that reports state changes through the log.
#[derive(Debug, Default)]
pub struct LogLed {
    on: AtomicBool,
}

impl LogLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}

impl Led for LogLed {
    fn set(&self, on: bool) -> DeviceResult<()> {
        if self.on.swap(on, Ordering::AcqRel) != on {
            tracing::trace!(on, "LED");
        }
        Ok(())
    }
}

/// Host stand-in for the ROM bootloader: the process exits and its
/// supervisor is expected to start it again.
#[derive(Debug, Default)]
pub struct ProcessRestart;

impl Bootloader for ProcessRestart {
    fn enter(&self) {
        warn!("Entering boot loader mode...");
        std::process::exit(0);
    }
}

/// ADC returning a settable raw sample. Clones share the sample.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    raw: Arc<AtomicU16>,
}

impl SimulatedAdc {
    pub fn new(raw: u16) -> Self {
        info!(raw, "Simulated ADC initialised");
        Self {
            raw: Arc::new(AtomicU16::new(raw)),
        }
    }

    pub fn set(&self, raw: u16) {
        self.raw.store(raw, Ordering::Release);
    }
}

impl Adc for SimulatedAdc {
    fn read(&self) -> u16 {
        self.raw.load(Ordering::Acquire)
    }
}
