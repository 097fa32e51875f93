//! Create handler.
//!
//! `POST /tasks`

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks_persistence::core::TaskStorage;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::TaskBody;
use crate::responses::headers::{Alert, TaskHeaders};
use crate::state::AppState;

/// Handler for creating a task.
///
/// The primary store assigns the id. The search index picks the task up
/// afterwards, within the consistency window.
///
/// # Response
///
/// - `201 Created` - Task created, with `Location: /tasks/{id}`
/// - `400 Bad Request` - Body carries an id (`idexists`) or misses a required
///   field (`required`)
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    TaskBody(task): TaskBody,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    debug!(name_en = ?task.name_en, "Processing create request");

    if task.id.is_some() {
        return Err(RestError::IdExists);
    }
    task.validate()?;

    let saved = state.storage().save(task).await?;
    let id = saved.id.ok_or_else(|| RestError::InternalError {
        message: "primary store returned a task without an id".to_string(),
    })?;

    debug!(id = id, "Task created");

    let headers = TaskHeaders::new()
        .with_alert(Alert::Created, id)
        .with_location(format!("/tasks/{}", id))
        .to_header_map();

    Ok((StatusCode::CREATED, headers, Json(saved)).into_response())
}
