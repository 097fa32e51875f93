//! Search handler.
//!
//! `GET /search/tasks?query=...` runs against the search index only, so
//! results trail primary writes by at most the consistency window.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks_persistence::core::{SearchProvider, TaskStorage};
use tasks_persistence::types::PageRequest;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::SearchParams;
use crate::responses::headers::TaskHeaders;
use crate::state::AppState;

/// Handler for searching tasks.
///
/// # Query Parameters
///
/// - `query` - Required. See [`SearchQuery`](tasks_persistence::types::SearchQuery)
/// - `sort`, `page`, `size` - As for listing
///
/// # Response
///
/// - `200 OK` - Matching tasks, ordered by id unless sorted
/// - `400 Bad Request` - Malformed query (`badquery`)
pub async fn search_handler<S>(
    State(state): State<AppState<S>>,
    params: SearchParams,
) -> RestResult<Response>
where
    S: TaskStorage + SearchProvider + Send + Sync,
{
    debug!(query = %params.query(), "Processing search request");

    let request = params
        .list()
        .page_request(state.default_page_size(), state.max_page_size())?;

    let request = request.unwrap_or_else(|| PageRequest::everything(params.list().sort().clone()));
    let page = state.storage().search(params.query(), Some(&request)).await?;

    debug!(hits = page.items.len(), total = page.total, "Search completed");

    if params.list().is_paged() {
        let headers = TaskHeaders::new()
            .with_total_count(page.total)
            .to_header_map();
        Ok((StatusCode::OK, headers, Json(page.items)).into_response())
    } else {
        Ok((StatusCode::OK, Json(page.items)).into_response())
    }
}
