//! Index maintenance endpoint.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks_persistence::core::{IndexMaintenance, TaskStorage};
use tracing::info;

use crate::error::RestResult;
use crate::state::AppState;

/// Handler for a full index reconciliation.
///
/// Compares every primary record with its index document and repairs the
/// index. Returns the differences found and how many were repaired.
///
/// # HTTP Request
///
/// `POST /admin/search/reconcile`
pub async fn reconcile_handler<S>(State(state): State<AppState<S>>) -> RestResult<Response>
where
    S: TaskStorage + IndexMaintenance + Send + Sync,
{
    let result = state.storage().reconcile().await?;

    info!(
        differences = result.differences,
        repaired = result.repaired,
        failed = result.failed,
        "Search index reconciled"
    );

    Ok((StatusCode::OK, Json(result)).into_response())
}
