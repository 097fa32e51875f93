//! Store construction and eventual-consistency helpers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
use tasks_persistence::composite::{CompositeStorage, RetryConfig, SyncConfig, SyncMode};
use tasks_persistence::core::{SearchIndex, SearchProvider};
use tasks_persistence::error::{BackendError, StorageError, StorageResult};
use tasks_persistence::types::{Page, PageRequest, SearchQuery, Task};

/// Longest time a test waits for the index to converge.
pub const CONSISTENCY_WINDOW: Duration = Duration::from_secs(5);

/// Creates an initialized in-memory primary store.
pub fn create_primary() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    Arc::new(backend)
}

/// Creates an initialized in-memory search index.
pub fn create_index() -> Arc<SqliteSearchIndex> {
    let index = SqliteSearchIndex::in_memory().expect("Failed to create search index");
    index.init_schema().expect("Failed to initialize index schema");
    Arc::new(index)
}

/// Retry settings short enough for tests.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
    }
}

/// Sync settings for tests.
pub fn test_sync_config(mode: SyncMode) -> SyncConfig {
    SyncConfig::default()
        .with_mode(mode)
        .with_retry(fast_retry())
        .with_reconcile_interval(Duration::from_millis(50))
}

/// Creates a composite over fresh in-memory stores.
pub fn create_composite(
    mode: SyncMode,
) -> (CompositeStorage, Arc<SqliteBackend>, Arc<SqliteSearchIndex>) {
    let primary = create_primary();
    let index = create_index();
    let storage = CompositeStorage::new(test_sync_config(mode), primary.clone(), index.clone());
    (storage, primary, index)
}

/// Polls `check` until it returns true or the consistency window elapses.
pub async fn await_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + CONSISTENCY_WINDOW;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// A search index that fails writes while switched off or for a fixed
/// number of calls.
pub struct FlakyIndex {
    inner: Arc<SqliteSearchIndex>,
    failing: AtomicBool,
    failures_left: AtomicU32,
    write_attempts: AtomicU32,
}

impl FlakyIndex {
    /// Wraps an index that never fails until told to.
    pub fn new(inner: Arc<SqliteSearchIndex>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            failures_left: AtomicU32::new(0),
            write_attempts: AtomicU32::new(0),
        }
    }

    /// Fails every write until [`set_failing(false)`](Self::set_failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fails the next `count` writes.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of write calls seen, failed ones included.
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> StorageResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let consumed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed || self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "flaky-index".to_string(),
                message: "injected failure".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchProvider for FlakyIndex {
    async fn search(
        &self,
        query: &SearchQuery,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<Task>> {
        self.inner.search(query, page).await
    }

    async fn indexed_count(&self) -> StorageResult<u64> {
        self.inner.indexed_count().await
    }
}

#[async_trait]
impl SearchIndex for FlakyIndex {
    fn index_name(&self) -> &'static str {
        "flaky-index"
    }

    async fn save(&self, task: &Task) -> StorageResult<()> {
        self.check_write()?;
        self.inner.save(task).await
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.delete_by_id(id).await
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.check_write()?;
        self.inner.delete_all().await
    }

    async fn find_all(&self) -> StorageResult<Vec<Task>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }
}

/// A search index that holds back writes of tasks with a given English name,
/// widening the window between a sync's primary read and its index write.
pub struct DelayingIndex {
    inner: Arc<SqliteSearchIndex>,
    slow_name: String,
    delay: Duration,
}

impl DelayingIndex {
    /// Wraps `inner`, delaying saves of tasks named `slow_name` by `delay`.
    pub fn new(inner: Arc<SqliteSearchIndex>, slow_name: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner,
            slow_name: slow_name.into(),
            delay,
        }
    }
}

#[async_trait]
impl SearchProvider for DelayingIndex {
    async fn search(
        &self,
        query: &SearchQuery,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<Task>> {
        self.inner.search(query, page).await
    }

    async fn indexed_count(&self) -> StorageResult<u64> {
        self.inner.indexed_count().await
    }
}

#[async_trait]
impl SearchIndex for DelayingIndex {
    fn index_name(&self) -> &'static str {
        "delaying-index"
    }

    async fn save(&self, task: &Task) -> StorageResult<()> {
        if task.name_en.as_deref() == Some(self.slow_name.as_str()) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.save(task).await
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        self.inner.delete_by_id(id).await
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.inner.delete_all().await
    }

    async fn find_all(&self) -> StorageResult<Vec<Task>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }
}
