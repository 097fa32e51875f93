//! Server configuration for the Tasks REST API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TASKS_SERVER_PORT` | 8080 | Server port |
//! | `TASKS_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `TASKS_LOG_LEVEL` | info | Log level |
//! | `TASKS_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `TASKS_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `TASKS_ENABLE_CORS` | true | Enable CORS |
//! | `TASKS_CORS_ORIGINS` | * | Allowed origins |
//! | `TASKS_CORS_METHODS` | GET,POST,PUT,PATCH,DELETE,OPTIONS | Allowed methods |
//! | `TASKS_CORS_HEADERS` | Content-Type,Authorization,Accept | Allowed headers |
//! | `TASKS_DATABASE_URL` | tasks.db | Primary store path (`:memory:` allowed) |
//! | `TASKS_INDEX_URL` | tasks-index.db | Search index path (`:memory:` allowed) |
//! | `TASKS_DEFAULT_PAGE_SIZE` | 20 | Page size when only `page` is given |
//! | `TASKS_MAX_PAGE_SIZE` | 1000 | Largest accepted `size` |
//! | `TASKS_SYNC_MODE` | async | Index sync mode (`async` or `sync`) |
//! | `TASKS_CONSISTENCY_WINDOW_MS` | 5000 | Longest enqueue wait for an index event |
//! | `TASKS_SYNC_MAX_RETRIES` | 5 | Retries before an id is parked |
//! | `TASKS_SYNC_INITIAL_DELAY_MS` | 50 | First retry delay |
//! | `TASKS_SYNC_MAX_DELAY_MS` | 1000 | Retry delay cap |
//! | `TASKS_SYNC_QUEUE_CAPACITY` | 1000 | Sync queue capacity |
//! | `TASKS_RECONCILE_INTERVAL_MS` | 1000 | Parked id retry interval |
//! | `TASKS_REINDEX_ON_STARTUP` | true | Reconcile the index at startup |
//!
//! # Example
//!
//! ```rust
//! use tasks_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use clap::Parser;
use tasks_persistence::composite::{RetryConfig, SyncConfig, SyncMode};

/// Server configuration for the Tasks REST API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "tasks")]
#[command(about = "Tasks REST API server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "TASKS_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "TASKS_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TASKS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "TASKS_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "TASKS_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "TASKS_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "TASKS_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "TASKS_CORS_METHODS",
        default_value = "GET,POST,PUT,PATCH,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "TASKS_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept"
    )]
    pub cors_headers: String,

    /// Primary store database path.
    #[arg(long, env = "TASKS_DATABASE_URL", default_value = "tasks.db")]
    pub database_url: String,

    /// Search index database path.
    #[arg(long, env = "TASKS_INDEX_URL", default_value = "tasks-index.db")]
    pub index_url: String,

    /// Page size used when a request gives `page` without `size`.
    #[arg(long, env = "TASKS_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u32,

    /// Maximum accepted page size.
    #[arg(long, env = "TASKS_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: u32,

    /// Index sync mode (`async` or `sync`).
    #[arg(long, env = "TASKS_SYNC_MODE", default_value = "async")]
    pub sync_mode: SyncMode,

    /// Longest time a write waits to enqueue its index event, in milliseconds.
    #[arg(long, env = "TASKS_CONSISTENCY_WINDOW_MS", default_value = "5000")]
    pub consistency_window_ms: u64,

    /// Retries before a failing index write is parked for repair.
    #[arg(long, env = "TASKS_SYNC_MAX_RETRIES", default_value = "5")]
    pub sync_max_retries: u32,

    /// First retry delay in milliseconds.
    #[arg(long, env = "TASKS_SYNC_INITIAL_DELAY_MS", default_value = "50")]
    pub sync_initial_delay_ms: u64,

    /// Retry delay cap in milliseconds.
    #[arg(long, env = "TASKS_SYNC_MAX_DELAY_MS", default_value = "1000")]
    pub sync_max_delay_ms: u64,

    /// Capacity of the index sync queue.
    #[arg(long, env = "TASKS_SYNC_QUEUE_CAPACITY", default_value = "1000")]
    pub sync_queue_capacity: usize,

    /// Interval between retries of parked ids, in milliseconds.
    #[arg(long, env = "TASKS_RECONCILE_INTERVAL_MS", default_value = "1000")]
    pub reconcile_interval_ms: u64,

    /// Reconcile the search index against the primary store at startup.
    #[arg(
        long,
        env = "TASKS_REINDEX_ON_STARTUP",
        default_value = "true",
        action = clap::ArgAction::Set
    )]
    pub reindex_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PUT,PATCH,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept".to_string(),
            database_url: "tasks.db".to_string(),
            index_url: "tasks-index.db".to_string(),
            default_page_size: 20,
            max_page_size: 1000,
            sync_mode: SyncMode::Asynchronous,
            consistency_window_ms: 5000,
            sync_max_retries: 5,
            sync_initial_delay_ms: 50,
            sync_max_delay_ms: 1000,
            sync_queue_capacity: 1000,
            reconcile_interval_ms: 1000,
            reindex_on_startup: true,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// Falls back to defaults when the environment does not parse.
    pub fn from_env() -> Self {
        Self::try_parse_from(["tasks"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the index synchronization settings.
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_mode(self.sync_mode)
            .with_consistency_window(Duration::from_millis(self.consistency_window_ms))
            .with_queue_capacity(self.sync_queue_capacity)
            .with_reconcile_interval(Duration::from_millis(self.reconcile_interval_ms))
            .with_retry(RetryConfig {
                max_retries: self.sync_max_retries,
                initial_delay: Duration::from_millis(self.sync_initial_delay_ms),
                max_delay: Duration::from_millis(self.sync_max_delay_ms),
                ..RetryConfig::default()
            })
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if self.index_url.trim().is_empty() {
            errors.push("Index URL cannot be empty".to_string());
        }

        if self.consistency_window_ms == 0 {
            errors.push("Consistency window cannot be 0".to_string());
        }

        if self.sync_queue_capacity == 0 {
            errors.push("Sync queue capacity cannot be 0".to_string());
        }

        if self.reconcile_interval_ms == 0 {
            errors.push("Reconcile interval cannot be 0".to_string());
        }

        if self.sync_initial_delay_ms > self.sync_max_delay_ms {
            errors.push("Initial sync retry delay cannot exceed max delay".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses in-memory stores, ephemeral port 0 and short sync delays.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            log_level: "debug".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            database_url: ":memory:".to_string(),
            index_url: ":memory:".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            sync_initial_delay_ms: 5,
            sync_max_delay_ms: 50,
            reconcile_interval_ms: 100,
            reindex_on_startup: false,
            ..Default::default()
        }
    }
}
