//! Device server harness for integration tests.
//!
//! Starts a [`DeviceServer`] on an available loopback port and drains its
//! blink queue so the serve loop never waits on the signaler.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pico_core::SystemClock;
use pico_device::{
    BlinkQueue, Bootloader, DeviceServer, Handler, HumidityApi, PanicApi, PanicLatch,
    ServerSettings, SimulatedAdc,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Bootloader that only counts entries.
#[derive(Default)]
pub struct CountingBootloader {
    entered: AtomicUsize,
}

impl CountingBootloader {
    pub fn count(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

impl Bootloader for CountingBootloader {
    fn enter(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running device server.
pub struct TestDevice {
    addr: SocketAddr,
    pub latch: Arc<PanicLatch>,
    pub bootloader: Arc<CountingBootloader>,
    blinks: Arc<Mutex<Vec<u32>>>,
}

impl TestDevice {
    /// Start a panic button node with the given connection deadline.
    pub async fn start_panic(conn_timeout: Duration) -> Self {
        let latch = Arc::new(PanicLatch::new());
        let bootloader = Arc::new(CountingBootloader::default());
        let api = PanicApi::new(latch.clone(), bootloader.clone(), Arc::new(SystemClock));
        let (addr, blinks) = spawn_server(api, conn_timeout).await;

        Self {
            addr,
            latch,
            bootloader,
            blinks,
        }
    }

    /// Start a humidity node whose ADC is controlled by the returned handle.
    pub async fn start_humidity(raw: u16) -> (Self, SimulatedAdc) {
        let adc = SimulatedAdc::new(raw);
        let api = HumidityApi::new(Arc::new(adc.clone()));
        let (addr, blinks) = spawn_server(api, Duration::from_secs(3)).await;

        let device = Self {
            addr,
            latch: Arc::new(PanicLatch::new()),
            bootloader: Arc::new(CountingBootloader::default()),
            blinks,
        };
        (device, adc)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Toggle counts the serve loop has enqueued so far.
    pub async fn blinks(&self) -> Vec<u32> {
        self.blinks.lock().await.clone()
    }

    /// Send `GET path` over a raw socket and return the full response text.
    pub async fn raw_get(&self, path: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: pico\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }
}

async fn spawn_server<H: Handler + 'static>(
    handler: H,
    conn_timeout: Duration,
) -> (SocketAddr, Arc<Mutex<Vec<u32>>>) {
    let (blink, mut requests) = BlinkQueue::bounded(3);
    let settings = ServerSettings {
        conn_timeout,
        ..Default::default()
    };
    let server = DeviceServer::bind("127.0.0.1:0".parse().unwrap(), handler, blink, settings)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let blinks = Arc::new(Mutex::new(Vec::new()));
    let recorded = blinks.clone();
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            recorded.lock().await.push(request.count());
        }
    });
    tokio::spawn(server.run());

    (addr, blinks)
}
