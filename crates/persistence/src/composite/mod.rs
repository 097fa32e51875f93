//! Composite storage: a primary store mirrored into a search index.
//!
//! # Design Principles
//!
//! 1. **Single Source of Truth**: The primary store handles every write and
//!    every read by id. It is the authoritative store.
//!
//! 2. **Derived Index**: The search index only ever holds full snapshots
//!    copied from the primary. It can be wiped and rebuilt with a
//!    reconciliation.
//!
//! 3. **Eventual Consistency**: The index may lag behind the primary by at
//!    most the configured consistency window (sync/async modes).
//!
//! 4. **Writes Never Fail on the Index**: An index failure is logged, counted
//!    and retried; the primary write still succeeds.
//!
//! # Write Path
//!
//! ```text
//! save/delete ──► primary ──► SyncEvent{id, kind} ──► queue ──► worker
//!                                                              │
//!                               re-read primary ◄──────────────┘
//!                                     │
//!                                     ▼
//!                          index.save(snapshot) / index.delete(id)
//! ```
//!
//! # Module Structure
//!
//! - [`config`] - Sync and retry configuration
//! - [`storage`] - CompositeStorage implementation
//! - [`sync`] - Sync manager, worker and reconciler

pub mod config;
pub mod storage;
pub mod sync;

pub use config::{RetryConfig, SyncConfig, SyncMode};
pub use storage::{BackendHealth, CompositeStorage};
pub use sync::{
    DynSearchIndex, DynTaskStorage, SyncEvent, SyncEventKind, SyncManager, SyncReconciler,
};
