//! Patch handler.
//!
//! `PATCH /tasks/{id}` with a JSON Merge Patch (RFC 7386) document. Fields
//! present in the document overwrite the stored task, `null` clears a field,
//! absent fields are kept. The merged task is validated as a whole, so
//! clearing `nameEn` or `nameAr` rejects the write.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tasks_persistence::core::TaskStorage;
use tasks_persistence::types::Task;
use tracing::debug;

use super::{parse_path_id, update_existing};
use crate::error::{RestError, RestResult};
use crate::extractors::MergePatchBody;
use crate::responses::headers::{Alert, TaskHeaders};
use crate::state::AppState;

/// Handler for the merge-patch interaction.
///
/// # Headers
///
/// - `Content-Type` - `application/merge-patch+json` or `application/json`
///
/// # Response
///
/// - `200 OK` - Task patched
/// - `400 Bad Request` - Same identity and validation rules as a full update
/// - `415 Unsupported Media Type` - Any other content type
pub async fn patch_handler<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    MergePatchBody(document): MergePatchBody,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    let id = parse_path_id(&id)?;
    debug!(id = id, "Processing patch request");

    let body_id = body_id(&document)?;
    if body_id != id {
        return Err(RestError::IdInvalid {
            path_id: id,
            body_id,
        });
    }

    let existing = state
        .storage()
        .find_by_id(id)
        .await?
        .ok_or(RestError::IdNotFound { id })?;

    let patched = apply_merge_patch(&existing, &document)?;
    patched.validate()?;

    let saved = update_existing(state.storage(), patched).await?;

    debug!(id = id, "Task patched");

    let headers = TaskHeaders::new()
        .with_alert(Alert::Updated, id)
        .to_header_map();
    Ok((StatusCode::OK, headers, Json(saved)).into_response())
}

/// Reads the id from a merge-patch document.
fn body_id(document: &Value) -> RestResult<i64> {
    match document.get("id") {
        None | Some(Value::Null) => Err(RestError::IdNull),
        Some(value) => value.as_i64().ok_or_else(|| RestError::BadRequest {
            message: format!("id must be an integer, got {}", value),
            error_key: "idinvalid",
        }),
    }
}

/// Applies a merge-patch document to a task.
fn apply_merge_patch(existing: &Task, document: &Value) -> RestResult<Task> {
    let mut merged = serde_json::to_value(existing).map_err(|e| RestError::InternalError {
        message: format!("failed to serialize task: {}", e),
    })?;
    json_patch::merge(&mut merged, document);
    Ok(serde_json::from_value(merged)?)
}
