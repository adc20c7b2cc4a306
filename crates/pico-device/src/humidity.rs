//! Humidity node: every request returns the current raw ADC sample.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api::Handler;
use crate::hal::Adc;
use crate::http::{RequestHead, Response};

/// Body served by the humidity node. The raw sample is sent as an integer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdcSample {
    pub value: u16,
}

/// Stateless handler: no routing, no latch.
pub struct HumidityApi {
    adc: Arc<dyn Adc>,
}

impl HumidityApi {
    pub fn new(adc: Arc<dyn Adc>) -> Self {
        Self { adc }
    }
}

impl Handler for HumidityApi {
    fn handle(&self, _request: &RequestHead<'_>, response: &mut Response) -> &'static str {
        response.set_connection_close();
        info!("Got humidity request...");
        response.write_json(&AdcSample {
            value: self.adc.read(),
        });
        "humidity"
    }
}
