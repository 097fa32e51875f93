//! SQLite backend implementation.
//!
//! This module provides both halves of the default deployment: the primary
//! task store ([`SqliteBackend`]) and the search index
//! ([`SqliteSearchIndex`]). Each uses its own database so the index can be
//! dropped and rebuilt from the primary at any time.
//!
//! Both support in-memory databases (for tests) and file-based databases.
//!
//! # Example
//!
//! ```no_run
//! use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = SqliteBackend::open("tasks.db")?;
//! primary.init_schema()?;
//!
//! let index = SqliteSearchIndex::in_memory()?;
//! index.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! -- Primary store
//! CREATE TABLE tasks (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name_en TEXT,
//!     name_ar TEXT,
//!     status INTEGER,
//!     code TEXT
//! );
//!
//! -- Search index
//! CREATE TABLE task_documents (
//!     id INTEGER PRIMARY KEY,
//!     name_en TEXT, name_ar TEXT, status INTEGER, code TEXT,
//!     name_en_norm TEXT, name_ar_norm TEXT, code_norm TEXT,
//!     document TEXT NOT NULL,
//!     indexed_at TEXT NOT NULL
//! );
//! ```

mod backend;
mod index;
mod query_builder;
mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig, is_memory_path};
pub use index::SqliteSearchIndex;
pub use query_builder::{SqlFragment, SqlParam, build_where};
