//! Exporter HTTP server using axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::ExporterResult;
use crate::surface::MetricsSurface;

/// Content type of the Prometheus text format.
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Landing page of the panic exporter.
pub const PANIC_INDEX: &str = include_str!("../static/panic.html");
/// Landing page of the humidity exporter.
pub const HUMIDITY_INDEX: &str = include_str!("../static/humidity.html");

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    surface: Arc<MetricsSurface>,
    index: &'static str,
}

impl AppState {
    pub fn new(surface: Arc<MetricsSurface>, index: &'static str) -> Self {
        Self { surface, index }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/metrics", get(serve_metrics))
        .with_state(state)
}

async fn serve_index(State(state): State<AppState>) -> Html<&'static str> {
    Html(state.index)
}

async fn serve_metrics(State(state): State<AppState>) -> Response {
    match state.surface.render().await {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> ExporterResult<()> {
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Bind `addr` and serve.
pub async fn run_server(addr: SocketAddr, state: AppState) -> ExporterResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting exporter server");
    serve(listener, state).await
}
