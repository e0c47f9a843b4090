//! Exposition server
//!
//! `GET /metrics` and `GET /` render the metric model in the Prometheus text
//! format; `GET /health` is a liveness probe that never requires a token.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use virtstat_core::MetricModel;
use virtstat_domain::{Result, VirtstatError};

use super::auth::require_token;
use crate::keystone::TokenValidator;

/// Content type of the Prometheus text exposition format.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared state of the exposition routes.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<MetricModel>,
    /// `None` serves every scrape without authentication
    pub validator: Option<Arc<dyn TokenValidator>>,
}

impl AppState {
    pub fn new(model: Arc<MetricModel>, validator: Option<Arc<dyn TokenValidator>>) -> Self {
        Self { model, validator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind the exposition listener.
///
/// # Errors
/// Returns `VirtstatError::Network` if the address cannot be bound.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| VirtstatError::Network(format!("Failed to bind {addr}: {e}")))
}

/// Serve `router` until `shutdown` is cancelled, then drain open requests.
///
/// # Errors
/// Returns `VirtstatError::Network` if the server fails while accepting.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Serving metrics");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| VirtstatError::Network(format!("HTTP server failed: {e}")))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.model.render() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics\n").into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
