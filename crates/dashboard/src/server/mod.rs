//! JSON HTTP surface.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::sources::Sources;
use crate::types::DashboardSnapshot;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub sources: Arc<Sources>,
    pub snapshot: watch::Receiver<Arc<DashboardSnapshot>>,
}

/// Build the router with CORS and request tracing.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/price", get(handlers::price))
        .route("/history", get(handlers::history))
        .route("/feargreed", get(handlers::fear_greed))
        .route("/halving", get(handlers::halving))
        .route("/onchain/metrics", get(handlers::onchain_metrics))
        .route("/dashboard", get(handlers::dashboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server.cors_max_age_seconds))
}

/// Any origin may read; only `GET` / `OPTIONS` with `Content-Type` / `Accept`.
fn cors_layer(max_age_seconds: u64) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(max_age_seconds))
}

/// Bind `bind_addr` and serve until `shutdown` fires.
pub async fn serve(router: Router, bind_addr: &str, shutdown: CancellationToken) -> Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind address: {bind_addr}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
