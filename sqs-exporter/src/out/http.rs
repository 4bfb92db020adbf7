use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::sink::PrometheusSink;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

pub const HEALTH_PATH: &str = "/health";

pub fn router(metrics_path: &str, sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route(HEALTH_PATH, get(health_handler))
        .with_state(sink)
}

/// Serves until `shutdown` resolves. `host` may be an IP or a hostname.
pub async fn serve(
    host: &str,
    port: u16,
    metrics_path: &str,
    sink: Arc<PrometheusSink>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!("started metrics server on {}", listener.local_addr()?);

    axum::serve(listener, router(metrics_path, sink))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn metrics_handler(State(sink): State<Arc<PrometheusSink>>) -> impl IntoResponse {
    match sink.encode() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("error encoding metrics: {e}"),
            )
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
