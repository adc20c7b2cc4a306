//! Mock webhook receiver.
//!
//! Records every JSON body posted to it and answers with a configurable
//! status code.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    bodies: Arc<Mutex<Vec<Value>>>,
    status: Arc<AtomicU16>,
}

pub struct MockWebhook {
    addr: SocketAddr,
    recorder: Recorder,
}

impl MockWebhook {
    /// Start a receiver answering `204 No Content`.
    pub async fn start() -> Self {
        let recorder = Recorder::default();
        recorder.status.store(204, Ordering::SeqCst);

        let app = Router::new()
            .route("/hook", post(receive))
            .with_state(recorder.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, recorder }
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    /// Answer subsequent posts with `status`.
    pub fn respond_with(&self, status: u16) {
        self.recorder.status.store(status, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<Value> {
        self.recorder.bodies.lock().clone()
    }
}

async fn receive(State(recorder): State<Recorder>, Json(body): Json<Value>) -> StatusCode {
    recorder.bodies.lock().push(body);
    StatusCode::from_u16(recorder.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
