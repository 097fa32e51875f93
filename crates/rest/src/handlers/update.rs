//! Update handler.
//!
//! `PUT /tasks/{id}` replaces every field of an existing task. There is no
//! upsert: the target must already exist.

use axum::{
    Json,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tasks_persistence::core::TaskStorage;
use tracing::debug;

use super::{parse_path_id, update_existing};
use crate::error::{RestError, RestResult};
use crate::extractors::TaskBody;
use crate::responses::headers::{Alert, TaskHeaders};
use crate::state::AppState;

/// Handler for replacing a task.
///
/// # Response
///
/// - `200 OK` - Task replaced
/// - `400 Bad Request` - Body id missing (`idnull`), different from the path
///   id (`idinvalid`), unknown (`idnotfound`), or a required field missing
///   (`required`)
pub async fn update_handler<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    TaskBody(task): TaskBody,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    let id = parse_path_id(&id)?;
    debug!(id = id, "Processing update request");

    let body_id = task.id.ok_or(RestError::IdNull)?;
    if body_id != id {
        return Err(RestError::IdInvalid {
            path_id: id,
            body_id,
        });
    }
    if !state.storage().exists_by_id(id).await? {
        return Err(RestError::IdNotFound { id });
    }
    task.validate()?;

    let saved = update_existing(state.storage(), task).await?;

    debug!(id = id, "Task updated");

    let headers = TaskHeaders::new()
        .with_alert(Alert::Updated, id)
        .to_header_map();
    Ok((StatusCode::OK, headers, Json(saved)).into_response())
}

/// Handler for writes on the collection path without an id.
///
/// `PUT /tasks` and `PATCH /tasks` always answer 405.
pub async fn collection_write_handler(method: Method, uri: Uri) -> RestError {
    debug!(method = %method, path = %uri.path(), "Rejecting write without id");
    RestError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
