//! Search index traits.
//!
//! The search index is a derived copy of the primary store. It is written by
//! the synchronization layer and read by search requests:
//!
//! ```text
//! SearchProvider          (read side: queries)
//!     └── SearchIndex     (write side: snapshot upserts and deletes)
//!
//! IndexMaintenance        (convergence checks and repair, composite only)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::types::{Page, PageRequest, SearchQuery, Task};

/// Runs search queries.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Executes a query.
    ///
    /// Without a page request every match is returned, ordered by id.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend` - If the index cannot be queried
    async fn search(
        &self,
        query: &SearchQuery,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<Task>>;

    /// Number of documents currently in the index.
    async fn indexed_count(&self) -> StorageResult<u64>;
}

/// A writable search index holding full task snapshots.
#[async_trait]
pub trait SearchIndex: SearchProvider {
    /// Returns a human-readable name for this index.
    fn index_name(&self) -> &'static str;

    /// Stores a snapshot of the task, replacing any previous document.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(MissingId)` - If the task has no id
    async fn save(&self, task: &Task) -> StorageResult<()>;

    /// Removes the document for the id. Missing documents are ignored.
    async fn delete_by_id(&self, id: i64) -> StorageResult<bool>;

    /// Removes every document.
    async fn delete_all(&self) -> StorageResult<()>;

    /// Returns every document ordered by id.
    async fn find_all(&self) -> StorageResult<Vec<Task>>;

    /// Reads the document for the id.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>>;

    /// Counts documents.
    async fn count(&self) -> StorageResult<u64> {
        self.indexed_count().await
    }
}

/// Outcome of a full comparison between the primary store and the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Tasks in the primary store.
    pub primary_count: u64,

    /// Documents in the index before repair.
    pub index_count: u64,

    /// Total differences found.
    pub differences: u64,

    /// Ids present in the primary store but missing from the index.
    pub missing_in_index: Vec<i64>,

    /// Ids present in the index but not in the primary store.
    pub extra_in_index: Vec<i64>,

    /// Ids whose index snapshot differs from the primary record.
    pub content_mismatches: Vec<i64>,

    /// Differences that were repaired.
    pub repaired: u64,

    /// Differences that could not be repaired.
    pub failed: u64,
}

impl ReconciliationResult {
    /// Returns true when no difference was found.
    pub fn is_consistent(&self) -> bool {
        self.differences == 0
    }
}

/// Status of the search index synchronization.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSyncStatus {
    /// Last successful index write.
    pub last_success: Option<DateTime<Utc>>,

    /// Events accepted but not yet applied.
    pub pending_events: usize,

    /// Total events applied.
    pub total_synced: u64,

    /// Total failed attempts, retries included.
    pub total_errors: u64,

    /// Ids whose index write ran out of retries and awaits repair.
    pub parked: Vec<i64>,

    /// Whether sync is keeping up.
    pub healthy: bool,
}

/// Convergence checks and repair between a primary store and its index.
#[async_trait]
pub trait IndexMaintenance: Send + Sync {
    /// Waits until no index write is pending or parked.
    ///
    /// # Returns
    ///
    /// `true` if the index caught up within the timeout.
    async fn wait_for_sync(&self, timeout: Duration) -> bool;

    /// Returns a snapshot of the synchronization status.
    fn sync_status(&self) -> IndexSyncStatus;

    /// Compares both stores and repairs every difference.
    async fn reconcile(&self) -> StorageResult<ReconciliationResult>;
}
