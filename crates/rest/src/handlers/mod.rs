//! HTTP request handlers for the Tasks resource.
//!
//! - [`create`] - Create a task
//! - [`read`] - Read a task by id, or list all tasks
//! - [`update`] - Replace a task
//! - [`patch`] - Merge-patch a task
//! - [`delete`] - Delete a task
//! - [`search`] - Query the search index
//! - [`health`] - Health check endpoint
//! - [`admin`] - Index reconciliation

pub mod admin;
pub mod create;
pub mod delete;
pub mod health;
pub mod patch;
pub mod read;
pub mod search;
pub mod update;

// Re-export handlers for convenience
pub use admin::reconcile_handler;
pub use create::create_handler;
pub use delete::delete_handler;
pub use health::health_handler;
pub use patch::patch_handler;
pub use read::{list_handler, read_handler};
pub use search::search_handler;
pub use update::{collection_write_handler, update_handler};

use tasks_persistence::core::TaskStorage;
use tasks_persistence::error::{ResourceError, StorageError};
use tasks_persistence::types::Task;

use crate::error::{RestError, RestResult};

/// Parses a task id from a path segment.
pub(crate) fn parse_path_id(raw: &str) -> RestResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| RestError::BadRequest {
        message: format!("'{}' is not a valid task id", raw),
        error_key: "idinvalid",
    })
}

/// Overwrites an existing task.
///
/// A task that disappears between the handler's checks and the write is
/// reported as `idnotfound`, never recreated.
pub(crate) async fn update_existing<S>(storage: &S, task: Task) -> RestResult<Task>
where
    S: TaskStorage + ?Sized,
{
    storage.update(task).await.map_err(|e| match e {
        StorageError::Resource(ResourceError::NotFound { id }) => RestError::IdNotFound { id },
        other => other.into(),
    })
}
