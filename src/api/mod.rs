//! HTTP API — Axum server exposing per-session bet slips.
//!
//! Stands in for the UI surfaces (slip panel, inline bet input, live
//! betting view): every ledger operation is one route. CORS enabled for
//! browser clients.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/sessions/:session", axum::routing::delete(routes::end_session))
        .route(
            "/api/sessions/:session/slip",
            get(routes::get_slip).delete(routes::clear_slip),
        )
        .route("/api/sessions/:session/slip/selections", post(routes::add_selection))
        .route(
            "/api/sessions/:session/slip/selections/:id",
            axum::routing::delete(routes::remove_selection),
        )
        .route(
            "/api/sessions/:session/slip/selections/:id/stake",
            put(routes::update_stake),
        )
        .route("/api/sessions/:session/slip/place", post(routes::place_bet))
        .route("/api/sessions/:session/stakes", get(routes::list_stakes))
        .route("/api/sessions/:session/stakes/:key", put(routes::set_stake))
        .layer(cors)
        .with_state(state)
}

/// Periodically evict sessions idle for `max_idle`.
pub fn spawn_session_sweeper(state: AppState, max_idle: Duration) -> JoinHandle<()> {
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            state.evict_idle(max_idle).await;
        }
    })
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API port {port}"))?;

    info!(port, "Bet slip API listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
