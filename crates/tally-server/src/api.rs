//! API handlers for recording and querying events.
//!
//! Provides:
//! - `POST /event`: count one event reported by the bearer of the token
//! - `GET /events/{eventType}`: aggregated server-originated counts

use crate::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tally_events::{
    log_failed_event, log_failed_raw_event, query_server_events, save_event, Event, EventSummary,
    EventsError, RawEvent,
};
use tally_identity::{OriginatorTranslator, Resolution};
use tally_types::EventType;
use thiserror::Error;

/// Request body for `POST /event`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Event type label (e.g., `OTKExpired`).
    pub identifier: String,
    /// Device type label (e.g., `Server`, `iOS`).
    pub device_type: String,
    /// Day the event happened, as `YYYY-MM-DD`.
    pub date: String,
    /// Number of occurrences.
    pub count: i64,
}

/// Query parameters for `GET /events/{eventType}`.
#[derive(Debug, Deserialize)]
pub struct ServerEventsQuery {
    /// First day, `YYYY-MM-DD`. Required.
    pub start: Option<String>,
    /// Last day, inclusive. Omit for a single-day query.
    pub end: Option<String>,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<EventsError> for ApiError {
    fn from(err: EventsError) -> Self {
        if err.is_validation() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::InternalServerError(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Handler for `POST /event`.
///
/// The bearer token is the event's originator. Events that cannot be
/// recorded are logged through the originator's display form before the
/// error response is returned.
pub async fn record_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Value>, ApiError> {
    let originator = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

    let raw = RawEvent {
        identifier: payload.identifier,
        device_type: payload.device_type,
        date: payload.date,
        count: payload.count,
        originator,
    };

    let event = match raw.validate() {
        Ok(event) => event,
        Err(e) => {
            log_failed_raw_event(&state.translator, &e, &raw);
            return Err(e.into());
        }
    };

    let task_state = Arc::clone(&state);
    let task_event = event.clone();
    tokio::task::spawn_blocking(move || {
        let conn = task_state.pool.get().map_err(|e| {
            log_failed_event(&task_state.translator, &e, &task_event);
            ApiError::InternalServerError("database unavailable".to_string())
        })?;

        save_event(&conn, &task_state.translator, &task_event).map_err(|e| {
            log_failed_event(&task_state.translator, &e, &task_event);
            ApiError::from(e)
        })
    })
    .await
    .map_err(|e| save_task_failed(&state.translator, &event, e))??;

    Ok(Json(json!({ "status": "ok" })))
}

/// Logs an event whose save task panicked or was cancelled.
fn save_task_failed(
    translator: &OriginatorTranslator,
    event: &Event,
    err: tokio::task::JoinError,
) -> ApiError {
    log_failed_event(translator, &err, event);
    ApiError::InternalServerError(format!("task join error: {}", err))
}

/// Handler for `GET /events/{eventType}?start=YYYY-MM-DD[&end=YYYY-MM-DD]`.
///
/// Requires a bearer token that maps to a region, since stored sources can
/// include the raw tokens of unmapped originators.
pub async fn server_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(event_type): Path<String>,
    Query(params): Query<ServerEventsQuery>,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let region = match state.translator.resolve(&token) {
        Resolution::Mapped(region) => region,
        Resolution::Unmapped => return Err(ApiError::Unauthorized),
    };

    let event_type: EventType = event_type
        .parse()
        .map_err(|e: tally_types::ParseTagError| ApiError::BadRequest(e.to_string()))?;

    let start = params.start.unwrap_or_default();
    let end = params.end;

    let events = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("database unavailable: {}", e)))?;
        query_server_events(&conn, event_type, &start, end.as_deref()).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    tracing::debug!(
        region = %region,
        event_type = event_type.as_str(),
        rows = events.len(),
        "served server event query"
    );

    Ok(Json(events))
}
