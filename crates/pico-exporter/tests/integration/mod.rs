//! Integration tests for pico-exporter.
//!
//! These tests run the exporter against a real device server:
//! - Panic relay from device latch to webhook
//! - Scrape surface over HTTP
//! - Humidity exporter

pub mod common;
