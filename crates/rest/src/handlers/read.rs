//! Read and list handlers.
//!
//! `GET /tasks/{id}` and `GET /tasks`. Both read the primary store and are
//! immediately consistent with writes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks_persistence::core::TaskStorage;
use tracing::debug;

use super::parse_path_id;
use crate::error::{RestError, RestResult};
use crate::extractors::ListParams;
use crate::responses::headers::TaskHeaders;
use crate::state::AppState;

/// Handler for reading a task by id.
///
/// # Response
///
/// - `200 OK` - The task
/// - `404 Not Found` - Unknown id
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    let id = parse_path_id(&id)?;
    debug!(id = id, "Processing read request");

    let task = state
        .storage()
        .find_by_id(id)
        .await?
        .ok_or(RestError::NotFound { id })?;

    Ok((StatusCode::OK, Json(task)).into_response())
}

/// Handler for listing tasks.
///
/// Without `page`/`size` every task is returned in the requested order;
/// with them one page is returned and `X-Total-Count` is set.
pub async fn list_handler<S>(
    State(state): State<AppState<S>>,
    params: ListParams,
) -> RestResult<Response>
where
    S: TaskStorage + Send + Sync,
{
    debug!(sort = ?params.sort(), paged = params.is_paged(), "Processing list request");

    match params.page_request(state.default_page_size(), state.max_page_size())? {
        Some(request) => {
            let page = state.storage().find_page(&request).await?;
            let headers = TaskHeaders::new()
                .with_total_count(page.total)
                .to_header_map();
            Ok((StatusCode::OK, headers, Json(page.items)).into_response())
        }
        None => {
            let tasks = state.storage().find_all(params.sort()).await?;
            Ok((StatusCode::OK, Json(tasks)).into_response())
        }
    }
}
