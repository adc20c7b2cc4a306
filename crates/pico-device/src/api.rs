//! Panic button HTTP routes.

use std::sync::Arc;

use pico_core::{Clock, PanicStatus, PulseStatus};
use pico_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::hal::Bootloader;
use crate::http::{RequestHead, Response};
use crate::latch::PanicLatch;

const INDEX_HTML: &[u8] = include_bytes!("../static/index.html");

/// Fills in a response for one request.
///
/// Handlers run on the serve loop itself, one request at a time.
pub trait Handler: Send + Sync {
    /// Prepare `response` for `request` and return a route label for metrics.
    fn handle(&self, request: &RequestHead<'_>, response: &mut Response) -> &'static str;
}

/// Routes of the panic button node.
///
/// | Path | Status | Side effect |
/// |---|---|---|
/// | `/` | 200 html | none |
/// | `/panic` | 200 json | clears the latch |
/// | `/pulse` | 200 json | none |
/// | `/force_panic` | 201 empty | sets the latch |
/// | `/boot` | none guaranteed | restarts into the bootloader |
/// | other | 404 empty | none |
pub struct PanicApi {
    latch: Arc<PanicLatch>,
    bootloader: Arc<dyn Bootloader>,
    clock: Arc<dyn Clock>,
}

impl PanicApi {
    pub fn new(
        latch: Arc<PanicLatch>,
        bootloader: Arc<dyn Bootloader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            latch,
            bootloader,
            clock,
        }
    }

    /// Read and clear the latch.
    ///
    /// The timestamp is the read instant; the set instant is not kept.
    pub fn check_panic(&self) -> PanicStatus {
        if self.latch.read_and_clear() {
            PanicStatus::raised(self.clock.now())
        } else {
            PanicStatus::quiet()
        }
    }
}

impl Handler for PanicApi {
    fn handle(&self, request: &RequestHead<'_>, response: &mut Response) -> &'static str {
        response.set_connection_close();

        match request.target {
            "/" => {
                info!("Got webpage request...");
                response.set_body("text/html", INDEX_HTML);
                "index"
            }
            "/panic" => {
                info!("Got panic request...");
                let status = self.check_panic();
                if status.panic {
                    info!(timestamp = %status.timestamp, "Panic observed and cleared");
                }
                response.write_json(&status);
                "panic"
            }
            "/pulse" => {
                info!("Got pulse request...");
                response.write_json(&PulseStatus::up());
                "pulse"
            }
            "/force_panic" => {
                info!("Got force panic request...");
                Metrics::latch_set("force");
                self.latch.set();
                response.set_status(201);
                "force_panic"
            }
            "/boot" => {
                warn!("Got boot request...");
                self.bootloader.enter();
                "boot"
            }
            other => {
                debug!(path = other, method = request.method, "Path not found");
                response.set_status(404);
                "not_found"
            }
        }
    }
}
