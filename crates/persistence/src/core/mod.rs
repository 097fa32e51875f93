//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database driver abstraction
//! - [`TaskStorage`] - Authoritative task CRUD
//! - [`SearchProvider`], [`SearchIndex`] - Query and write sides of the index
//! - [`IndexMaintenance`] - Convergence checks and repair
//!
//! ```text
//! TaskStorage          SearchProvider
//!                          └── SearchIndex
//! ```
//!
//! The composite storage implements `TaskStorage`, `SearchProvider` and
//! `IndexMaintenance` at once, which is what the REST layer depends on.

mod backend;
mod search;
mod storage;

pub use backend::{Backend, BackendKind, BackendRole};
pub use search::{
    IndexMaintenance, IndexSyncStatus, ReconciliationResult, SearchIndex, SearchProvider,
};
pub use storage::TaskStorage;
