//! Application state for the Tasks REST API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the storage and the server configuration.

use std::sync::Arc;

use tasks_persistence::core::TaskStorage;

use crate::config::ServerConfig;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The storage type (must implement [`TaskStorage`]); handlers that
///   search or inspect the index add their own bounds
///
/// # Example
///
/// ```rust,ignore
/// use tasks_rest::{AppState, ServerConfig};
///
/// let storage = CompositeStorage::new(SyncConfig::default(), primary, index);
/// let state = AppState::new(Arc::new(storage), ServerConfig::default());
/// ```
pub struct AppState<S> {
    /// The storage backend.
    storage: Arc<S>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: TaskStorage> AppState<S> {
    /// Creates a new AppState with the given storage and configuration.
    pub fn new(storage: Arc<S>, config: ServerConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns a clone of the storage Arc.
    pub fn storage_arc(&self) -> Arc<S> {
        Arc::clone(&self.storage)
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the page size used when only a page number is given.
    pub fn default_page_size(&self) -> u32 {
        self.config.default_page_size
    }

    /// Returns the maximum page size.
    pub fn max_page_size(&self) -> u32 {
        self.config.max_page_size
    }
}
