//! Real device servers on loopback ports.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pico_core::SystemClock;
use pico_device::{
    BlinkQueue, Bootloader, DeviceServer, Handler, HumidityApi, PanicApi, PanicLatch,
    ServerSettings, SimulatedAdc,
};

struct NoBootloader;

impl Bootloader for NoBootloader {
    fn enter(&self) {}
}

/// Start a panic button node. Returns its base URL and latch.
pub async fn start_panic_device() -> (String, Arc<PanicLatch>) {
    let latch = Arc::new(PanicLatch::new());
    let api = PanicApi::new(latch.clone(), Arc::new(NoBootloader), Arc::new(SystemClock));
    let addr = spawn(api).await;
    (format!("http://{addr}"), latch)
}

/// Start a humidity node reporting `raw`.
pub async fn start_humidity_device(raw: u16) -> (String, SimulatedAdc) {
    let adc = SimulatedAdc::new(raw);
    let addr = spawn(HumidityApi::new(Arc::new(adc.clone()))).await;
    (format!("http://{addr}"), adc)
}

async fn spawn<H: Handler + 'static>(handler: H) -> SocketAddr {
    let (blink, mut requests) = BlinkQueue::bounded(3);
    let settings = ServerSettings {
        conn_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let server = DeviceServer::bind("127.0.0.1:0".parse().unwrap(), handler, blink, settings)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move { while requests.recv().await.is_some() {} });
    tokio::spawn(server.run());
    addr
}
