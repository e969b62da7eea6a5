//! Tally server library logic.
//!
//! Hosts the event store behind a small HTTP surface: devices and the key
//! exchange service report events with their bearer token, and operators
//! query aggregated counts of server-originated events.

pub mod api;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tally_db::DbPool;
use tally_identity::OriginatorTranslator;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Originator translator backed by the process-wide token table.
    pub translator: OriginatorTranslator,
}

/// Maximum request body size (16 KiB). Event reports are tiny.
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
///
/// The trace layer records method and path only; bearer tokens travel in
/// headers and are never part of a span.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/event", post(api::record_event_handler))
        .route("/events/{eventType}", get(api::server_events_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
