//! Integration tests for pico-device.
//!
//! These tests run the real serve loop on a loopback port:
//! - Latch semantics observed over HTTP
//! - Connection deadline and serialization
//! - Humidity variant

pub mod common;
