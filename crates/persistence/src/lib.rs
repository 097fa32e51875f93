//! Tasks Persistence Layer
//!
//! This crate stores tasks in an authoritative primary store and mirrors them
//! into a search index that is kept eventually consistent with the primary.
//!
//! # Features
//!
//! - **Primary Store**: Identity-indexed task CRUD with sorting and paging
//! - **Search Index**: Field filters, prefix and substring matching over
//!   denormalized task snapshots
//! - **Synchronization**: Inline or queued index updates with bounded retry,
//!   repair of failed ids and full reconciliation
//!
//! # Backend Features
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`types`] - The `Task` entity, sorting, paging and the query language
//! - [`error`] - Error types for all operations
//! - [`core`] - Storage and search traits
//! - [`backends`] - Backend implementations (SQLite)
//! - [`composite`] - Primary + index composition and synchronization
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
//! use tasks_persistence::composite::{CompositeStorage, SyncConfig};
//! use tasks_persistence::core::{IndexMaintenance, SearchProvider, TaskStorage};
//! use tasks_persistence::types::{SearchQuery, Task};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = SqliteBackend::in_memory()?;
//! primary.init_schema()?;
//! let index = SqliteSearchIndex::in_memory()?;
//! index.init_schema()?;
//!
//! let storage = CompositeStorage::new(
//!     SyncConfig::default(),
//!     Arc::new(primary),
//!     Arc::new(index),
//! );
//!
//! let task = storage
//!     .save(Task::new().name_en("Inventory").name_ar("جرد").status(1))
//!     .await?;
//!
//! storage.wait_for_sync(Duration::from_secs(5)).await;
//! let hits = storage.search(&SearchQuery::parse("nameEn:inv*")?, None).await?;
//! assert_eq!(hits.items, vec![task]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod composite;
pub mod core;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Page, PageRequest, SearchQuery, Sort, Task};

// Re-export core traits
pub use core::{
    Backend, BackendKind, IndexMaintenance, IndexSyncStatus, ReconciliationResult, SearchIndex,
    SearchProvider, TaskStorage,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
