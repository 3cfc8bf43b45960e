//! Route handlers for the symcheck API.

use crate::types::{AnalyzeRequest, AnalyzeResponse, HealthResponse, HistoryQuery, MessageResponse};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use symcheck_kernel::{KernelError, SymcheckKernel};
use tracing::error;

/// Shared application state.
pub struct AppState {
    pub kernel: Arc<SymcheckKernel>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(kernel: Arc<SymcheckKernel>) -> Self {
        Self {
            kernel,
            started_at: Instant::now(),
        }
    }
}

fn error_response(e: KernelError) -> (StatusCode, Json<serde_json::Value>) {
    if e.is_not_found() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Entry not found"})),
        );
    }
    error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
}

/// A missing content type is read as JSON; any other non-JSON type is refused.
fn is_json_or_absent(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return true;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// GET /: Static welcome payload.
pub async fn root() -> impl IntoResponse {
    Json(MessageResponse::new(
        "Welcome to the Healthcare Symptom Checker API",
    ))
}

/// POST /analyze: Run the model fallback loop and record the outcome.
///
/// Always 200 when the store is healthy, including when every model
/// failed; in that case `result` carries the fallback message. A body with
/// no content type is parsed as JSON.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !is_json_or_absent(&headers) {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(serde_json::json!({
                "error": "Expected request with `Content-Type: application/json`"
            })),
        );
    }
    let Json(body) = match Json::<AnalyzeRequest>::from_bytes(&body) {
        Ok(b) => b,
        Err(rejection) => {
            return (
                rejection.status(),
                Json(serde_json::json!({"error": rejection.body_text()})),
            )
        }
    };

    match state.kernel.analyze_and_record(&body.text).await {
        Ok(recorded) => (
            StatusCode::OK,
            Json(serde_json::json!(AnalyzeResponse {
                result: recorded.outcome.text,
            })),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /history: Stored analyses, newest first, optionally keyword-filtered.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    match state.kernel.list_history(query.keyword).await {
        Ok(records) => (StatusCode::OK, Json(serde_json::json!(records))),
        Err(e) => error_response(e),
    }
}

/// DELETE /history/{id}: Remove one entry.
pub async fn delete_history_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.kernel.delete_history_entry(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!(MessageResponse::new(format!(
                "Entry {id} deleted successfully"
            )))),
        ),
        Err(e) => error_response(e),
    }
}

/// DELETE /history: Remove every entry.
pub async fn clear_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.kernel.clear_history().await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!(MessageResponse::new(
                "All history deleted successfully"
            ))),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/health: Liveness plus analysis counters.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        kernel: state.kernel.health(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
