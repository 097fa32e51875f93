//! Delete handler.
//!
//! `DELETE /tasks/{id}`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks_persistence::core::TaskStorage;
use tracing::debug;

use super::parse_path_id;
use crate::error::RestResult;
use crate::responses::headers::{Alert, TaskHeaders};
use crate::state::AppState;

/// Handler for deleting a task.
///
/// Deleting an unknown id is not an error. The index entry is removed after
/// the primary record, within the consistency window.
///
/// # Response
///
/// - `204 No Content` - Task absent from the primary store
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    let id = parse_path_id(&id)?;
    debug!(id = id, "Processing delete request");

    let removed = state.storage().delete_by_id(id).await?;
    debug!(id = id, removed = removed, "Task deleted");

    let headers = TaskHeaders::new()
        .with_alert(Alert::Deleted, id)
        .to_header_map();
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}
