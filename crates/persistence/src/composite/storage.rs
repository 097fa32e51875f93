//! CompositeStorage implementation.
//!
//! `CompositeStorage` pairs the authoritative primary store with the search
//! index and implements every storage trait the REST layer needs:
//!
//! - **Writes**: go to the primary; the index is updated afterwards by the
//!   [`SyncManager`]
//! - **Reads by id / list**: go to the primary and are immediately consistent
//! - **Search**: goes to the index and is eventually consistent
//!
//! # Example
//!
//! ```ignore
//! use tasks_persistence::composite::{CompositeStorage, SyncConfig};
//!
//! let storage = CompositeStorage::new(SyncConfig::default(), primary, index);
//!
//! let task = storage.save(Task::new().name_en("A").name_ar("ب")).await?;
//! storage.wait_for_sync(Duration::from_secs(5)).await;
//! let hits = storage.search(&SearchQuery::by_id(task.id.unwrap()), None).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::core::{
    BackendRole, IndexMaintenance, IndexSyncStatus, ReconciliationResult, SearchProvider,
    TaskStorage,
};
use crate::error::{StorageError, StorageResult};
use crate::types::{Page, PageRequest, SearchQuery, Sort, Task};

use super::config::SyncConfig;
use super::sync::{DynSearchIndex, DynTaskStorage, SyncEvent, SyncManager};

/// Consecutive failures before a backend is reported unhealthy.
const FAILURE_THRESHOLD: u32 = 3;

/// Composite storage over a primary store and a search index.
pub struct CompositeStorage {
    /// Primary storage backend.
    primary: DynTaskStorage,

    /// Search index.
    index: DynSearchIndex,

    /// Synchronization manager.
    sync_manager: SyncManager,

    /// Backend health status.
    health_status: Arc<RwLock<HashMap<BackendRole, BackendHealth>>>,
}

/// Health status for a backend.
#[derive(Debug, Clone)]
pub struct BackendHealth {
    /// Whether the backend is healthy.
    pub healthy: bool,

    /// Last successful operation timestamp.
    pub last_success: Option<std::time::Instant>,

    /// Consecutive failure count.
    pub failure_count: u32,

    /// Last error message.
    pub last_error: Option<String>,
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            last_success: None,
            failure_count: 0,
            last_error: None,
        }
    }
}

impl CompositeStorage {
    /// Creates a composite storage.
    ///
    /// When called inside a Tokio runtime the sync worker is started. Without
    /// a runtime, index writes are applied inline and parked ids are only
    /// retried by [`retry_parked`](Self::retry_parked) or a reconciliation.
    pub fn new(config: SyncConfig, primary: DynTaskStorage, index: DynSearchIndex) -> Self {
        let mut sync_manager = SyncManager::new(config, primary.clone(), index.clone());
        if tokio::runtime::Handle::try_current().is_ok() {
            sync_manager.start_worker();
        } else {
            warn!("No Tokio runtime available, search index sync worker not started");
        }

        let mut health_status = HashMap::new();
        health_status.insert(BackendRole::Primary, BackendHealth::default());
        health_status.insert(BackendRole::SearchIndex, BackendHealth::default());

        Self {
            primary,
            index,
            sync_manager,
            health_status: Arc::new(RwLock::new(health_status)),
        }
    }

    /// Returns the sync configuration.
    pub fn sync_config(&self) -> &SyncConfig {
        self.sync_manager.config()
    }

    /// Returns the primary backend.
    pub fn primary(&self) -> &DynTaskStorage {
        &self.primary
    }

    /// Returns the search index.
    pub fn index(&self) -> &DynSearchIndex {
        &self.index
    }

    /// Returns the sync manager.
    pub fn sync_manager(&self) -> &SyncManager {
        &self.sync_manager
    }

    /// Retries every parked id once.
    pub async fn retry_parked(&self) -> usize {
        self.sync_manager.retry_parked().await
    }

    /// Returns the health status for a backend.
    pub fn backend_health(&self, role: BackendRole) -> Option<BackendHealth> {
        self.health_status.read().get(&role).cloned()
    }

    /// Returns true if a backend is healthy.
    pub fn is_backend_healthy(&self, role: BackendRole) -> bool {
        self.health_status
            .read()
            .get(&role)
            .map(|h| h.healthy)
            .unwrap_or(false)
    }

    /// Updates health status after an operation.
    fn update_health(&self, role: BackendRole, success: bool, error: Option<String>) {
        let mut status = self.health_status.write();
        let health = status.entry(role).or_default();
        if success {
            health.healthy = true;
            health.last_success = Some(std::time::Instant::now());
            health.failure_count = 0;
            health.last_error = None;
        } else {
            health.failure_count += 1;
            health.last_error = error;

            if health.failure_count >= FAILURE_THRESHOLD && health.healthy {
                health.healthy = false;
                warn!(
                    backend = %role,
                    failures = health.failure_count,
                    "Backend marked unhealthy"
                );
            }
        }
    }

    fn track<T>(&self, role: BackendRole, result: &StorageResult<T>) {
        self.update_health(role, result.is_ok(), result.as_ref().err().map(|e| e.to_string()));
    }

    /// Propagates a primary write to the index.
    async fn sync_to_index(&self, event: SyncEvent) {
        debug!(id = event.id, kind = ?event.kind, "Propagating write to search index");
        self.sync_manager.sync(event).await;
    }
}

#[async_trait]
impl TaskStorage for CompositeStorage {
    fn backend_name(&self) -> &'static str {
        "composite"
    }

    #[instrument(skip(self, task), fields(id = ?task.id))]
    async fn save(&self, task: Task) -> StorageResult<Task> {
        let is_new = task.is_transient();

        // All writes go to primary
        let result = self.primary.save(task).await;
        self.track(BackendRole::Primary, &result);
        let saved = result?;

        if let Some(id) = saved.id {
            let event = if is_new {
                SyncEvent::created(id)
            } else {
                SyncEvent::updated(id)
            };
            self.sync_to_index(event).await;
        }

        Ok(saved)
    }

    #[instrument(skip(self, task), fields(id = ?task.id))]
    async fn update(&self, task: Task) -> StorageResult<Task> {
        let result = self.primary.update(task).await;
        // A missing task is a caller error, not a primary failure
        if !matches!(result, Err(StorageError::Resource(_))) {
            self.track(BackendRole::Primary, &result);
        }
        let updated = result?;

        if let Some(id) = updated.id {
            self.sync_to_index(SyncEvent::updated(id)).await;
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>> {
        // Reads always go to primary (source of truth)
        let result = self.primary.find_by_id(id).await;
        self.track(BackendRole::Primary, &result);
        result
    }

    async fn exists_by_id(&self, id: i64) -> StorageResult<bool> {
        let result = self.primary.exists_by_id(id).await;
        self.track(BackendRole::Primary, &result);
        result
    }

    async fn find_all(&self, sort: &Sort) -> StorageResult<Vec<Task>> {
        let result = self.primary.find_all(sort).await;
        self.track(BackendRole::Primary, &result);
        result
    }

    async fn find_page(&self, request: &PageRequest) -> StorageResult<Page<Task>> {
        let result = self.primary.find_page(request).await;
        self.track(BackendRole::Primary, &result);
        result
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        let result = self.primary.delete_by_id(id).await;
        self.track(BackendRole::Primary, &result);
        let removed = result?;

        // Also sent when nothing was removed so a stray document cannot linger
        self.sync_to_index(SyncEvent::deleted(id)).await;

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> StorageResult<()> {
        let result = self.primary.delete_all().await;
        self.track(BackendRole::Primary, &result);
        result?;

        let cleared = self.index.delete_all().await;
        self.track(BackendRole::SearchIndex, &cleared);
        if let Err(e) = cleared {
            warn!(error = %e, "Failed to clear search index, reconciliation will remove stale documents");
        }

        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        self.primary.count().await
    }
}

#[async_trait]
impl SearchProvider for CompositeStorage {
    #[instrument(skip(self, query, page), fields(query = %query))]
    async fn search(
        &self,
        query: &SearchQuery,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<Task>> {
        let result = self.index.search(query, page).await;
        self.track(BackendRole::SearchIndex, &result);
        result
    }

    async fn indexed_count(&self) -> StorageResult<u64> {
        self.index.indexed_count().await
    }
}

#[async_trait]
impl IndexMaintenance for CompositeStorage {
    async fn wait_for_sync(&self, timeout: Duration) -> bool {
        self.sync_manager.wait_for_sync(timeout).await
    }

    fn sync_status(&self) -> IndexSyncStatus {
        self.sync_manager.status()
    }

    #[instrument(skip(self))]
    async fn reconcile(&self) -> StorageResult<ReconciliationResult> {
        let result = self.sync_manager.reconcile().await;
        self.track(BackendRole::SearchIndex, &result);
        result
    }
}
