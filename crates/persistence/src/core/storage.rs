//! Primary task storage trait.
//!
//! This module defines the [`TaskStorage`] trait, the authoritative
//! identity-indexed store for tasks.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{Page, PageRequest, Sort, Task};

/// Core storage trait for tasks.
///
/// Implementations are the source of truth. Validation of required fields is
/// the caller's responsibility; the store persists whatever it is given.
///
/// # Example
///
/// ```ignore
/// use tasks_persistence::core::TaskStorage;
/// use tasks_persistence::types::{Sort, Task};
///
/// async fn example<S: TaskStorage>(storage: &S) -> StorageResult<()> {
///     let saved = storage.save(Task::new().name_en("A").name_ar("ب")).await?;
///     let id = saved.id.unwrap();
///
///     assert!(storage.exists_by_id(id).await?);
///     let all = storage.find_all(&Sort::default()).await?;
///     assert_eq!(all.len() as u64, storage.count().await?);
///
///     storage.delete_by_id(id).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Saves a task.
    ///
    /// A transient task (no id) is inserted and receives a new id. A task with
    /// an id overwrites every field of the stored row with that id, or is
    /// inserted under that id when no such row exists.
    ///
    /// # Returns
    ///
    /// The saved task, with its id set.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend` - If the underlying database fails
    async fn save(&self, task: Task) -> StorageResult<Task>;

    /// Overwrites every field of an existing task.
    ///
    /// The existence check and the write are a single operation, so a task
    /// deleted concurrently is never brought back.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(ResourceError::MissingId)` - If the task has no id
    /// * `StorageError::Resource(ResourceError::NotFound)` - If no task has that id
    /// * `StorageError::Backend` - If the underlying database fails
    async fn update(&self, task: Task) -> StorageResult<Task>;

    /// Reads a task by id.
    ///
    /// # Returns
    ///
    /// The task if it exists, or `None`.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>>;

    /// Checks whether a task with the given id exists.
    ///
    /// The default implementation reads the task.
    async fn exists_by_id(&self, id: i64) -> StorageResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Returns all tasks in the given order.
    async fn find_all(&self, sort: &Sort) -> StorageResult<Vec<Task>>;

    /// Returns one page of tasks together with the total count.
    async fn find_page(&self, request: &PageRequest) -> StorageResult<Page<Task>>;

    /// Deletes a task by id.
    ///
    /// Deleting an id that does not exist is not an error.
    ///
    /// # Returns
    ///
    /// `true` if a row was removed.
    async fn delete_by_id(&self, id: i64) -> StorageResult<bool>;

    /// Deletes every task.
    async fn delete_all(&self) -> StorageResult<()>;

    /// Counts stored tasks.
    async fn count(&self) -> StorageResult<u64>;
}
