//! Health check endpoint handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tasks_persistence::core::{IndexMaintenance, IndexSyncStatus, SearchProvider, TaskStorage};
use tracing::{debug, warn};

use crate::error::RestResult;
use crate::state::AppState;

/// Body of the health response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `UP`, `DEGRADED` (index behind or failing) or `DOWN` (primary failing).
    pub status: &'static str,
    /// Storage backend name.
    pub backend: &'static str,
    /// Tasks in the primary store.
    pub primary_count: Option<u64>,
    /// Documents in the search index.
    pub indexed_count: Option<u64>,
    /// Index synchronization status.
    pub sync: IndexSyncStatus,
    /// Time of the check.
    pub timestamp: String,
}

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - Primary store reachable; `status` is `UP` or `DEGRADED`
/// - `503 Service Unavailable` - Primary store unreachable
pub async fn health_handler<S>(State(state): State<AppState<S>>) -> RestResult<Response>
where
    S: TaskStorage + SearchProvider + IndexMaintenance + Send + Sync,
{
    debug!("Processing health check request");

    let storage = state.storage();
    let primary_count = storage
        .count()
        .await
        .inspect_err(|e| warn!(error = %e, "Primary store health check failed"))
        .ok();
    let indexed_count = storage
        .indexed_count()
        .await
        .inspect_err(|e| warn!(error = %e, "Search index health check failed"))
        .ok();
    let sync = storage.sync_status();

    let (status_code, status) = match (primary_count, indexed_count) {
        (None, _) => (StatusCode::SERVICE_UNAVAILABLE, "DOWN"),
        (Some(_), Some(_)) if sync.healthy => (StatusCode::OK, "UP"),
        (Some(_), _) => (StatusCode::OK, "DEGRADED"),
    };

    let report = HealthReport {
        status,
        backend: storage.backend_name(),
        primary_count,
        indexed_count,
        sync,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok((status_code, Json(report)).into_response())
}
