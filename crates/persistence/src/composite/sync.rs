//! Synchronization between the primary store and the search index.
//!
//! Every primary write produces a [`SyncEvent`] carrying only the task id and
//! the kind of write. Applying an upsert event re-reads the task from the
//! primary store and writes that full snapshot to the index, so the index
//! converges to whatever the primary holds last regardless of the order in
//! which concurrent writers committed.
//!
//! Applications for the same id are serialized: the primary re-read and the
//! index write happen under one per-id lock, whether the event is applied
//! inline, by the worker, by a parked retry or by a reconciliation repair.
//!
//! # Sync Modes
//!
//! | Mode | Description | Latency | Consistency |
//! |------|-------------|---------|-------------|
//! | Synchronous | Update the index before the write returns | Higher | Immediate |
//! | Asynchronous | Update via a bounded FIFO queue | Lower | Within the consistency window |
//!
//! # Failure Handling
//!
//! Index writes are retried with exponential backoff. An id whose retries run
//! out is parked; the background worker retries parked ids every reconcile
//! interval until they converge. Index failures never propagate to the caller
//! of the primary write.
//!
//! # Example
//!
//! ```ignore
//! use tasks_persistence::composite::{SyncConfig, SyncEvent, SyncManager};
//!
//! let mut manager = SyncManager::new(SyncConfig::default(), primary, index);
//! manager.start_worker();
//!
//! manager.sync(SyncEvent::created(42)).await;
//! assert!(manager.wait_for_sync(Duration::from_secs(5)).await);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{OwnedMutexGuard, mpsc};
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::time::{MissedTickBehavior, sleep};
use tracing::{debug, error, info, warn};

use crate::core::{IndexSyncStatus, ReconciliationResult, SearchIndex, TaskStorage};
use crate::error::{StorageResult, SyncError};
use crate::types::{Sort, Task};

use super::config::{RetryConfig, SyncConfig, SyncMode};

/// A dynamically typed primary store.
pub type DynTaskStorage = Arc<dyn TaskStorage>;

/// A dynamically typed search index.
pub type DynSearchIndex = Arc<dyn SearchIndex>;

/// The kind of primary write that produced a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncEventKind {
    /// Task was created.
    Create,
    /// Task was fully or partially updated.
    Update,
    /// Task was deleted.
    Delete,
    /// Task should be re-read and re-indexed.
    Reindex,
}

/// A synchronization event to propagate to the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEvent {
    /// Task id.
    pub id: i64,
    /// Kind of write.
    pub kind: SyncEventKind,
}

impl SyncEvent {
    /// Event for a newly created task.
    pub fn created(id: i64) -> Self {
        Self {
            id,
            kind: SyncEventKind::Create,
        }
    }

    /// Event for an updated task.
    pub fn updated(id: i64) -> Self {
        Self {
            id,
            kind: SyncEventKind::Update,
        }
    }

    /// Event for a deleted task.
    pub fn deleted(id: i64) -> Self {
        Self {
            id,
            kind: SyncEventKind::Delete,
        }
    }

    /// Event asking for the task to be re-indexed from the primary.
    pub fn reindex(id: i64) -> Self {
        Self {
            id,
            kind: SyncEventKind::Reindex,
        }
    }

    /// Returns true if applying this event removes the index document.
    pub fn is_removal(&self) -> bool {
        self.kind == SyncEventKind::Delete
    }
}

/// Per-id locks held across the primary re-read and the index write.
#[derive(Debug, Default)]
pub(crate) struct IdLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdLocks {
    async fn lock(&self, id: i64) -> IdGuard<'_> {
        let lock = self.locks.lock().entry(id).or_default().clone();
        let guard = lock.lock_owned().await;
        IdGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    /// Drops the entry for `id` once nobody holds or waits on it.
    fn release(&self, id: i64) {
        let mut locks = self.locks.lock();
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(self.id);
    }
}

/// Shared state between the manager and its worker.
#[derive(Debug, Default)]
struct SyncState {
    status: RwLock<IndexSyncStatus>,
    parked: Mutex<BTreeSet<i64>>,
    locks: Arc<IdLocks>,
}

impl SyncState {
    fn record_success(&self) {
        let mut status = self.status.write();
        status.last_success = Some(Utc::now());
        status.total_synced += 1;
    }

    fn record_errors(&self, count: u64) {
        self.status.write().total_errors += count;
    }

    fn finish_pending(&self) {
        let mut status = self.status.write();
        status.pending_events = status.pending_events.saturating_sub(1);
    }

    fn park(&self, id: i64) {
        self.parked.lock().insert(id);
    }

    fn unpark(&self, id: i64) {
        self.parked.lock().remove(&id);
    }

    fn parked_ids(&self) -> Vec<i64> {
        self.parked.lock().iter().copied().collect()
    }
}

/// Synchronization manager for the search index.
pub struct SyncManager {
    /// Configuration.
    config: SyncConfig,

    /// Authoritative store events are re-read from.
    primary: DynTaskStorage,

    /// Index being kept in sync.
    index: DynSearchIndex,

    /// Event queue for async mode.
    event_sender: Option<mpsc::Sender<SyncEvent>>,

    /// Status shared with the worker.
    state: Arc<SyncState>,
}

impl std::fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("config", &self.config)
            .field("worker_running", &self.event_sender.is_some())
            .finish_non_exhaustive()
    }
}

impl SyncManager {
    /// Creates a new sync manager. No worker runs until
    /// [`start_worker`](Self::start_worker) is called.
    pub fn new(config: SyncConfig, primary: DynTaskStorage, index: DynSearchIndex) -> Self {
        let state = Arc::new(SyncState::default());
        state.status.write().healthy = true;
        Self {
            config,
            primary,
            index,
            event_sender: None,
            state,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Starts the background worker.
    ///
    /// The worker drains the event queue in FIFO order and retries parked ids
    /// every reconcile interval. Must be called from within a Tokio runtime.
    pub fn start_worker(&mut self) -> tokio::task::JoinHandle<()> {
        let (sender, receiver) = mpsc::channel::<SyncEvent>(self.config.queue_capacity.max(1));
        self.event_sender = Some(sender);

        let worker = Worker {
            config: self.config.clone(),
            primary: self.primary.clone(),
            index: self.index.clone(),
            state: self.state.clone(),
        };

        info!(
            mode = %self.config.mode,
            queue_capacity = self.config.queue_capacity,
            "Starting search index sync worker"
        );

        tokio::spawn(async move {
            worker.run(receiver).await;
        })
    }

    /// Returns true if a worker has been started.
    pub fn has_worker(&self) -> bool {
        self.event_sender.is_some()
    }

    /// Propagates a primary write to the index.
    ///
    /// Never fails: errors are logged, counted and parked for repair.
    pub async fn sync(&self, event: SyncEvent) {
        match self.config.mode {
            SyncMode::Synchronous => self.sync_inline(event).await,
            SyncMode::Asynchronous => self.sync_asynchronous(event).await,
        }
    }

    async fn sync_inline(&self, event: SyncEvent) {
        let outcome = apply_with_retry(
            &event,
            self.primary.as_ref(),
            self.index.as_ref(),
            &self.state.locks,
            &self.config.retry,
        )
        .await;
        record_outcome(&self.state, &event, outcome);
    }

    /// Queues the event for the worker, waiting at most the consistency window.
    async fn sync_asynchronous(&self, event: SyncEvent) {
        let Some(sender) = self.event_sender.as_ref() else {
            warn!("Async sync requested but no worker started, falling back to sync");
            return self.sync_inline(event).await;
        };

        self.state.status.write().pending_events += 1;

        match sender
            .send_timeout(event, self.config.consistency_window)
            .await
        {
            Ok(()) => {
                debug!(id = event.id, kind = ?event.kind, "Queued index sync event");
            }
            Err(SendTimeoutError::Timeout(event)) => {
                self.state.finish_pending();
                self.state.park(event.id);
                warn!(
                    id = event.id,
                    timeout_ms = self.config.consistency_window.as_millis() as u64,
                    "Sync queue full, parking task for repair"
                );
            }
            Err(SendTimeoutError::Closed(event)) => {
                self.state.finish_pending();
                warn!(id = event.id, "Sync worker stopped, applying event inline");
                self.sync_inline(event).await;
            }
        }
    }

    /// Retries every parked id once. Returns how many converged.
    pub async fn retry_parked(&self) -> usize {
        retry_parked(&self.state, self.primary.as_ref(), self.index.as_ref()).await
    }

    /// Returns a snapshot of the sync status.
    pub fn status(&self) -> IndexSyncStatus {
        let mut status = self.state.status.read().clone();
        status.parked = self.state.parked_ids();
        status.healthy = status.parked.is_empty()
            && status.pending_events <= self.config.batch_size.saturating_mul(10);
        status
    }

    /// Checks if sync is keeping up.
    pub fn is_healthy(&self) -> bool {
        self.status().healthy
    }

    /// Returns true when nothing is pending or parked.
    pub fn is_idle(&self) -> bool {
        self.state.status.read().pending_events == 0 && self.state.parked.lock().is_empty()
    }

    /// Waits until nothing is pending or parked.
    pub async fn wait_for_sync(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.is_idle() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Compares both stores and repairs every difference.
    ///
    /// Repairs share the per-id locks of regular syncing. Parked ids are
    /// retried afterwards and stay parked unless they converge.
    pub async fn reconcile(&self) -> StorageResult<ReconciliationResult> {
        let result = SyncReconciler::with_locks(self.state.locks.clone())
            .reconcile(self.primary.as_ref(), self.index.as_ref())
            .await?;

        self.retry_parked().await;
        Ok(result)
    }
}

/// Background worker state.
struct Worker {
    config: SyncConfig,
    primary: DynTaskStorage,
    index: DynSearchIndex,
    state: Arc<SyncState>,
}

impl Worker {
    async fn run(self, mut receiver: mpsc::Receiver<SyncEvent>) {
        let mut repair = tokio::time::interval(self.config.reconcile_interval);
        repair.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = receiver.recv() => {
                    let Some(first) = received else {
                        debug!("Sync queue closed, worker exiting");
                        return;
                    };
                    let batch = self.collect_batch(first, &mut receiver).await;
                    self.process_batch(batch).await;
                }
                _ = repair.tick() => {
                    retry_parked(&self.state, self.primary.as_ref(), self.index.as_ref()).await;
                }
            }
        }
    }

    /// Collects events into a batch until it is full or the batch timeout passes.
    async fn collect_batch(
        &self,
        first: SyncEvent,
        receiver: &mut mpsc::Receiver<SyncEvent>,
    ) -> Vec<SyncEvent> {
        let mut batch = vec![first];
        let deadline = tokio::time::Instant::now() + self.config.batch_timeout;

        while batch.len() < self.config.batch_size.max(1) {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, receiver.recv()).await {
                Ok(Some(event)) => batch.push(event),
                Ok(None) | Err(_) => break,
            }
        }

        batch
    }

    async fn process_batch(&self, batch: Vec<SyncEvent>) {
        debug!(events = batch.len(), "Processing index sync batch");

        for event in batch {
            let outcome = apply_with_retry(
                &event,
                self.primary.as_ref(),
                self.index.as_ref(),
                &self.state.locks,
                &self.config.retry,
            )
            .await;
            record_outcome(&self.state, &event, outcome);
            self.state.finish_pending();
        }
    }
}

/// Outcome of applying one event with retries.
struct ApplyOutcome {
    failed_attempts: u32,
    result: Result<(), SyncError>,
}

fn record_outcome(state: &SyncState, event: &SyncEvent, outcome: ApplyOutcome) {
    state.record_errors(u64::from(outcome.failed_attempts));
    match outcome.result {
        Ok(()) => {
            state.record_success();
            state.unpark(event.id);
        }
        Err(e) => {
            state.park(event.id);
            error!(
                id = event.id,
                kind = ?event.kind,
                error = %e,
                "Index sync failed, task parked for repair"
            );
        }
    }
}

/// Applies one event to the index.
///
/// Upserts write the primary's current snapshot, or remove the document when
/// the task no longer exists in the primary.
async fn apply_event(
    event: &SyncEvent,
    primary: &dyn TaskStorage,
    index: &dyn SearchIndex,
) -> StorageResult<()> {
    if event.is_removal() {
        index.delete_by_id(event.id).await?;
        return Ok(());
    }

    match primary.find_by_id(event.id).await? {
        Some(task) => index.save(&task).await,
        None => {
            index.delete_by_id(event.id).await?;
            Ok(())
        }
    }
}

/// Applies one event while holding the lock for its id.
async fn apply_locked(
    event: &SyncEvent,
    primary: &dyn TaskStorage,
    index: &dyn SearchIndex,
    locks: &IdLocks,
) -> StorageResult<()> {
    let _held = locks.lock(event.id).await;
    apply_event(event, primary, index).await
}

/// Applies an event with retries. The lock is released between attempts.
async fn apply_with_retry(
    event: &SyncEvent,
    primary: &dyn TaskStorage,
    index: &dyn SearchIndex,
    locks: &IdLocks,
    retry_config: &RetryConfig,
) -> ApplyOutcome {
    let mut attempts = 0;

    loop {
        attempts += 1;

        match apply_locked(event, primary, index, locks).await {
            Ok(()) => {
                if attempts > 1 {
                    debug!(id = event.id, attempts = attempts, "Sync succeeded after retries");
                }
                return ApplyOutcome {
                    failed_attempts: attempts - 1,
                    result: Ok(()),
                };
            }
            Err(e) => {
                if attempts > retry_config.max_retries {
                    return ApplyOutcome {
                        failed_attempts: attempts,
                        result: Err(SyncError::RetriesExhausted {
                            id: event.id,
                            attempts,
                            message: e.to_string(),
                        }),
                    };
                }

                let delay = retry_config.delay_for(attempts);
                warn!(
                    id = event.id,
                    attempt = attempts,
                    max_retries = retry_config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Sync attempt failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Retries every parked id once, without backoff.
async fn retry_parked(state: &SyncState, primary: &dyn TaskStorage, index: &dyn SearchIndex) -> usize {
    let parked = state.parked_ids();
    if parked.is_empty() {
        return 0;
    }

    let mut converged = 0;
    for id in parked {
        match apply_locked(&SyncEvent::reindex(id), primary, index, &state.locks).await {
            Ok(()) => {
                state.unpark(id);
                state.record_success();
                converged += 1;
            }
            Err(e) => {
                state.record_errors(1);
                debug!(id = id, error = %e, "Parked task still failing");
            }
        }
    }

    if converged > 0 {
        info!(converged = converged, "Repaired parked index entries");
    }
    converged
}

/// Sync reconciliation for detecting and fixing inconsistencies.
#[derive(Debug, Default)]
pub struct SyncReconciler {
    locks: Arc<IdLocks>,
}

impl SyncReconciler {
    /// Creates a new reconciler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reconciler whose repairs share an existing set of id locks.
    pub(crate) fn with_locks(locks: Arc<IdLocks>) -> Self {
        Self { locks }
    }

    /// Compares the full contents of both stores and repairs the index.
    ///
    /// The comparison only selects ids. Each differing id is re-read from the
    /// primary under its lock, so a repair never writes a snapshot older than
    /// a concurrent sync of the same task.
    pub async fn reconcile(
        &self,
        primary: &dyn TaskStorage,
        index: &dyn SearchIndex,
    ) -> StorageResult<ReconciliationResult> {
        let primary_tasks: BTreeMap<i64, Task> = primary
            .find_all(&Sort::by_id())
            .await?
            .into_iter()
            .filter_map(|t| t.id.map(|id| (id, t)))
            .collect();
        let indexed: BTreeMap<i64, Task> = index
            .find_all()
            .await?
            .into_iter()
            .filter_map(|t| t.id.map(|id| (id, t)))
            .collect();

        let mut result = ReconciliationResult {
            primary_count: primary_tasks.len() as u64,
            index_count: indexed.len() as u64,
            ..Default::default()
        };

        for (id, task) in &primary_tasks {
            match indexed.get(id) {
                None => result.missing_in_index.push(*id),
                Some(doc) if doc != task => result.content_mismatches.push(*id),
                Some(_) => {}
            }
        }
        result.extra_in_index = indexed
            .keys()
            .filter(|id| !primary_tasks.contains_key(id))
            .copied()
            .collect();

        result.differences = (result.missing_in_index.len()
            + result.extra_in_index.len()
            + result.content_mismatches.len()) as u64;

        let to_repair: Vec<i64> = result
            .missing_in_index
            .iter()
            .chain(&result.content_mismatches)
            .chain(&result.extra_in_index)
            .copied()
            .collect();

        for id in to_repair {
            match apply_locked(&SyncEvent::reindex(id), primary, index, &self.locks).await {
                Ok(()) => result.repaired += 1,
                Err(e) => {
                    result.failed += 1;
                    warn!(id = id, error = %e, "Failed to repair index document");
                }
            }
        }

        if result.differences > 0 {
            info!(
                primary_count = result.primary_count,
                index_count = result.index_count,
                differences = result.differences,
                repaired = result.repaired,
                failed = result.failed,
                "Search index reconciled"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
    use crate::core::SearchProvider;

    fn stores() -> (Arc<SqliteBackend>, Arc<SqliteSearchIndex>) {
        let primary = SqliteBackend::in_memory().unwrap();
        primary.init_schema().unwrap();
        let index = SqliteSearchIndex::in_memory().unwrap();
        index.init_schema().unwrap();
        (Arc::new(primary), Arc::new(index))
    }

    fn task(name: &str) -> Task {
        Task::new().name_en(name).name_ar("م").status(1).code("X")
    }

    #[test]
    fn test_sync_event_constructors() {
        assert_eq!(SyncEvent::created(1).kind, SyncEventKind::Create);
        assert_eq!(SyncEvent::updated(1).kind, SyncEventKind::Update);
        assert!(SyncEvent::deleted(1).is_removal());
        assert!(!SyncEvent::reindex(1).is_removal());
    }

    #[test]
    fn test_sync_status_default() {
        let status = IndexSyncStatus::default();
        assert!(status.last_success.is_none());
        assert_eq!(status.pending_events, 0);
        assert_eq!(status.total_synced, 0);
        assert!(!status.healthy);
    }

    #[tokio::test]
    async fn test_synchronous_sync_writes_snapshot() {
        let (primary, index) = stores();
        let manager = SyncManager::new(
            SyncConfig::default().with_mode(SyncMode::Synchronous),
            primary.clone(),
            index.clone(),
        );

        let saved = primary.save(task("a")).await.unwrap();
        let id = saved.id.unwrap();
        manager.sync(SyncEvent::created(id)).await;

        assert_eq!(index.find_by_id(id).await.unwrap(), Some(saved));
        let status = manager.status();
        assert_eq!(status.total_synced, 1);
        assert!(status.healthy);
    }

    #[tokio::test]
    async fn test_upsert_of_missing_task_removes_document() {
        let (primary, index) = stores();
        let manager = SyncManager::new(
            SyncConfig::default().with_mode(SyncMode::Synchronous),
            primary.clone(),
            index.clone(),
        );

        index.save(&task("stale").with_id(9)).await.unwrap();
        manager.sync(SyncEvent::updated(9)).await;

        assert_eq!(index.indexed_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_async_worker_converges() {
        let (primary, index) = stores();
        let mut manager = SyncManager::new(SyncConfig::default(), primary.clone(), index.clone());
        manager.start_worker();

        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let id = primary.save(task(name)).await.unwrap().id.unwrap();
            manager.sync(SyncEvent::created(id)).await;
            ids.push(id);
        }
        primary.delete_by_id(ids[1]).await.unwrap();
        manager.sync(SyncEvent::deleted(ids[1])).await;

        assert!(manager.wait_for_sync(Duration::from_secs(5)).await);
        assert_eq!(index.indexed_count().await.unwrap(), 2);
        assert!(index.find_by_id(ids[1]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_id_locks_serialize_same_id_and_are_released() {
        let locks = Arc::new(IdLocks::default());

        let first = locks.lock(1).await;
        let other = locks.lock(2).await;
        assert_eq!(locks.len(), 2);

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _held = locks.lock(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(other);
        assert_eq!(locks.len(), 1);

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_retries_parked_ids() {
        let (primary, index) = stores();
        let manager = SyncManager::new(
            SyncConfig::default().with_mode(SyncMode::Synchronous),
            primary.clone(),
            index.clone(),
        );

        let id = primary.save(task("a")).await.unwrap().id.unwrap();
        manager.state.park(id);
        manager.state.park(42);

        let result = manager.reconcile().await.unwrap();

        assert_eq!(result.repaired, 1);
        assert!(manager.status().parked.is_empty());
        assert_eq!(index.find_by_id(id).await.unwrap().map(|t| t.id), Some(Some(id)));
    }

    #[tokio::test]
    async fn test_reconciler_repairs_all_differences() {
        let (primary, index) = stores();
        let a = primary.save(task("a")).await.unwrap();
        let b = primary.save(task("b")).await.unwrap();

        // b is stale, a is missing, 99 is extra
        index.save(&b.clone().name_en("old")).await.unwrap();
        index.save(&task("ghost").with_id(99)).await.unwrap();

        let result = SyncReconciler::new()
            .reconcile(primary.as_ref(), index.as_ref())
            .await
            .unwrap();

        assert_eq!(result.primary_count, 2);
        assert_eq!(result.index_count, 2);
        assert_eq!(result.missing_in_index, vec![a.id.unwrap()]);
        assert_eq!(result.content_mismatches, vec![b.id.unwrap()]);
        assert_eq!(result.extra_in_index, vec![99]);
        assert_eq!(result.differences, 3);
        assert_eq!(result.repaired, 3);

        assert_eq!(index.find_all().await.unwrap(), vec![a, b]);

        let again = SyncReconciler::new()
            .reconcile(primary.as_ref(), index.as_ref())
            .await
            .unwrap();
        assert!(again.is_consistent());
    }
}
