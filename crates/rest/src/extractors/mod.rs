//! Axum extractors for the Tasks API.
//!
//! - [`TaskBody`] - A task from a JSON request body
//! - [`MergePatchBody`] - A merge-patch document from a PATCH body
//! - [`ListParams`] - Sorting and optional paging
//! - [`SearchParams`] - The search query plus sorting and paging

mod list_params;
mod search_params;
mod task_body;

pub use list_params::ListParams;
pub use search_params::SearchParams;
pub use task_body::{MergePatchBody, TaskBody};
