//! Error types for the persistence layer.
//!
//! Errors are grouped by the concern that raised them: task state, validation,
//! search queries, index synchronization and the storage backends themselves.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Task state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search operation errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Index synchronization errors
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to task state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested task was not found.
    #[error("task not found: {id}")]
    NotFound { id: i64 },

    /// A task with the given id already exists.
    #[error("task already exists: {id}")]
    AlreadyExists { id: i64 },

    /// The operation needs a persisted task but the task has no id.
    #[error("task has no id")]
    MissingId,
}

/// Errors raised while checking a task before it is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is null or empty.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// The task violates a constraint other than a missing field.
    #[error("invalid task: {message}")]
    InvalidTask { message: String },
}

/// Errors related to search operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The query string could not be parsed.
    #[error("failed to parse query: {message}")]
    QueryParseError { message: String },

    /// The sort or filter names a field that does not exist.
    #[error("unknown field: {field}")]
    UnknownField { field: String },

    /// A field value could not be interpreted for the field's type.
    #[error("invalid value '{value}' for field {field}")]
    InvalidValue { field: String, value: String },

    /// The requested page is outside the configured limits.
    #[error("invalid page request: {message}")]
    InvalidPage { message: String },
}

/// Errors raised while mirroring primary writes into the search index.
#[derive(Error, Debug)]
pub enum SyncError {
    /// All retry attempts for an index write were used up.
    #[error("index sync for task {id} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        id: i64,
        attempts: u32,
        message: String,
    },

    /// The sync queue did not accept the event in time.
    #[error("sync queue unavailable: {message}")]
    QueueUnavailable { message: String },

    /// Waiting for the index to converge timed out.
    #[error("index did not converge within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Backend-specific errors.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is not reachable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for search query parsing.
pub type SearchResult<T> = Result<T, SearchError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

impl StorageError {
    /// Returns true when the error came from input the caller can fix.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(_) | StorageError::Validation(_) | StorageError::Search(_)
        )
    }
}
