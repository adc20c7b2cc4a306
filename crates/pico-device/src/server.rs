//! Single-connection accept/serve loop.
//!
//! One connection is serviced to completion (read, dispatch, write, close)
//! before the next is accepted. There is no worker pool: memory stays
//! bounded by one set of reused buffers, at the cost of serializing clients.
//! A per-connection deadline keeps a stalled client from holding the loop.

use std::net::SocketAddr;
use std::time::Duration;

use pico_core::BlinkRequest;
use pico_telemetry::Metrics;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::api::Handler;
use crate::blink::BlinkQueue;
use crate::error::{DeviceError, DeviceResult};
use crate::http::ConnectionBuffers;

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Serve loop settings.
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    pub conn_timeout: Duration,
    pub request_buffer_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            conn_timeout: Duration::from_secs(3),
            request_buffer_size: 1024,
        }
    }
}

/// Device HTTP server.
pub struct DeviceServer<H: Handler> {
    listener: TcpListener,
    handler: H,
    blink: BlinkQueue,
    settings: ServerSettings,
    buffers: ConnectionBuffers,
}

impl<H: Handler> DeviceServer<H> {
    /// Start listening on `addr`. Failure here is fatal for the device.
    pub async fn bind(
        addr: SocketAddr,
        handler: H,
        blink: BlinkQueue,
        settings: ServerSettings,
    ) -> DeviceResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(DeviceError::Listen)?;
        let local = listener.local_addr().map_err(DeviceError::Listen)?;
        info!(addr = %format!("http://{local}"), "listening");

        Ok(Self {
            listener,
            handler,
            blink,
            buffers: ConnectionBuffers::new(settings.request_buffer_size),
            settings,
        })
    }

    pub fn local_addr(&self) -> DeviceResult<SocketAddr> {
        self.listener.local_addr().map_err(DeviceError::Listen)
    }

    /// Accept and serve connections forever.
    pub async fn run(mut self) {
        loop {
            let (stream, remote) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %DeviceError::Accept(e), "listener accept");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };

            info!(remote = %remote, "new connection");
            match self.serve_connection(stream).await {
                Ok(route) => {
                    Metrics::device_request(route);
                    self.blink.enqueue(BlinkRequest::SERVICED).await;
                }
                Err(e) => {
                    Metrics::connection_abandoned(e.reason());
                    error!(remote = %remote, error = %e, "connection abandoned");
                }
            }
        }
    }

    /// Serve exactly one request on `stream` under the connection deadline.
    async fn serve_connection(&mut self, mut stream: TcpStream) -> DeviceResult<&'static str> {
        let deadline = self.settings.conn_timeout;
        let served = tokio::time::timeout(
            deadline,
            Self::serve_request(&self.handler, &mut self.buffers, &mut stream),
        )
        .await
        .map_err(|_| DeviceError::Deadline(deadline.as_millis() as u64))??;

        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "shutdown after response");
        }
        Ok(served)
    }

    async fn serve_request(
        handler: &H,
        buffers: &mut ConnectionBuffers,
        stream: &mut TcpStream,
    ) -> DeviceResult<&'static str> {
        buffers.reset();
        let (head, response) = buffers.read_request(stream).await?;
        let route = handler.handle(&head, response);
        buffers.write_response(stream).await?;
        Ok(route)
    }
}
