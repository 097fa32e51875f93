//! REST API test harness.

use std::sync::Arc;
use std::time::Duration;

use axum_test::{TestResponse, TestServer};
use serde_json::Value;
use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
use tasks_persistence::composite::{CompositeStorage, SyncMode};
use tasks_persistence::core::{IndexMaintenance, SearchIndex, TaskStorage};
use tasks_persistence::types::Task;

use tasks_rest::{AppState, ServerConfig, routing};

/// Longest time a test waits for the index to converge.
pub const CONSISTENCY_WINDOW: Duration = Duration::from_secs(5);

/// Media type for merge-patch bodies.
pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// A test server over a composite of two in-memory stores.
///
/// The primary store and the index are kept so tests can count and inspect
/// each store on its own.
pub struct TestApp {
    /// The test server instance.
    pub server: TestServer,

    /// The storage served by the app.
    pub storage: Arc<CompositeStorage>,

    /// Primary store behind the composite.
    pub primary: Arc<SqliteBackend>,

    /// Search index behind the composite.
    pub index: Arc<SqliteSearchIndex>,
}

impl TestApp {
    /// Creates an app syncing the index in the background.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::for_testing())
    }

    /// Creates an app that updates the index before responding.
    pub fn synchronous() -> Self {
        Self::with_config(ServerConfig {
            sync_mode: SyncMode::Synchronous,
            ..ServerConfig::for_testing()
        })
    }

    /// Creates an app with the given configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        let primary = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        primary.init_schema().expect("Failed to init schema");
        let primary = Arc::new(primary);

        let index = SqliteSearchIndex::in_memory().expect("Failed to create search index");
        index.init_schema().expect("Failed to init index schema");
        let index = Arc::new(index);

        let storage = Arc::new(CompositeStorage::new(
            config.to_sync_config(),
            primary.clone(),
            index.clone(),
        ));

        let state = AppState::new(Arc::clone(&storage), config);
        let server = TestServer::new(routing::create_routes(state))
            .expect("Failed to create test server");

        Self {
            server,
            storage,
            primary,
            index,
        }
    }

    /// Tasks in the primary store.
    pub async fn primary_count(&self) -> u64 {
        TaskStorage::count(self.primary.as_ref())
            .await
            .expect("Failed to count primary")
    }

    /// Documents in the search index.
    pub async fn index_count(&self) -> u64 {
        SearchIndex::count(self.index.as_ref())
            .await
            .expect("Failed to count index")
    }

    /// The index document for an id.
    pub async fn indexed(&self, id: i64) -> Option<Task> {
        SearchIndex::find_by_id(self.index.as_ref(), id)
            .await
            .expect("Failed to read index")
    }

    /// The primary record for an id.
    pub async fn stored(&self, id: i64) -> Option<Task> {
        TaskStorage::find_by_id(self.primary.as_ref(), id)
            .await
            .expect("Failed to read primary")
    }

    /// Waits until the index has caught up with every write so far.
    pub async fn settle(&self) {
        assert!(
            self.storage.wait_for_sync(CONSISTENCY_WINDOW).await,
            "Search index did not converge within {:?}",
            CONSISTENCY_WINDOW
        );
    }

    /// Creates a task through the API and returns it with its id.
    pub async fn create(&self, task: &Task) -> Task {
        let response = self.server.post("/tasks").json(task).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Task>()
    }

    /// Sends a merge-patch body.
    pub async fn merge_patch(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .patch(path)
            .content_type(MERGE_PATCH_JSON)
            .bytes(serde_json::to_vec(body).expect("serializable").into())
            .await
    }
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
