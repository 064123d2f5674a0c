// GET handlers: version, snapshot, history

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::SnapshotError;
use crate::models::SnapshotView;
use crate::version::{NAME, VERSION};

const DEFAULT_HISTORY_LIMIT: u32 = 10;
const MAX_HISTORY_LIMIT: u32 = 1000;

/// Envelope for every /api response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub error: bool,
    #[serde(default)]
    pub error_string: String,
    pub data: Option<T>,
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse {
        error: false,
        error_string: String::new(),
        data: Some(data),
    })
    .into_response()
}

fn error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            error: true,
            error_string: message,
            data: None,
        }),
    )
        .into_response()
}

fn snapshot_error_status(e: &SnapshotError) -> StatusCode {
    match e {
        SnapshotError::MetricsUnavailable(_) | SnapshotError::BrokerUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SnapshotError::PersistenceFailure(_) | SnapshotError::InitializationFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/snapshot: latest cached snapshot; computed on demand before the first tick.
pub(super) async fn snapshot_handler(State(state): State<AppState>) -> Response {
    match state.aggregator.current_or_compute().await {
        Ok(snapshot) => ok(SnapshotView::from(snapshot.as_ref())),
        Err(e) => {
            tracing::warn!(error = %e, operation = "get_snapshot", "snapshot request failed");
            error(snapshot_error_status(&e), e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<u32>,
}

/// GET /api/history: most recent persisted entity groups, oldest first.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Response {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    match state.repo.get_recent_entities(limit).await {
        Ok(rows) => ok(rows),
        Err(e) => {
            tracing::warn!(error = %e, operation = "get_recent_entities", "history request failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
