//! SQLite schema definitions and migrations.
//!
//! The primary store and the search index track their schema versions
//! independently, so both may live in the same database file.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current primary store schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Current search index schema version.
pub const INDEX_SCHEMA_VERSION: i32 = 1;

const PRIMARY_COMPONENT: &str = "tasks";
const INDEX_COMPONENT: &str = "task_documents";

fn schema_error(context: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message: format!("{}: {}", context, e),
        source: None,
    })
}

/// Initialize the primary store schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn, PRIMARY_COMPONENT)?;

    if current_version == 0 {
        create_tasks_v1(conn)?;
        set_schema_version(conn, PRIMARY_COMPONENT, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(StorageError::Backend(BackendError::MigrationError {
            message: format!(
                "database schema version {} is newer than supported version {}",
                current_version, SCHEMA_VERSION
            ),
        }));
    }

    Ok(())
}

/// Initialize the search index schema.
pub fn initialize_index_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn, INDEX_COMPONENT)?;

    if current_version == 0 {
        create_task_documents_v1(conn)?;
        set_schema_version(conn, INDEX_COMPONENT, INDEX_SCHEMA_VERSION)?;
    } else if current_version > INDEX_SCHEMA_VERSION {
        return Err(StorageError::Backend(BackendError::MigrationError {
            message: format!(
                "index schema version {} is newer than supported version {}",
                current_version, INDEX_SCHEMA_VERSION
            ),
        }));
    }

    Ok(())
}

/// Get the schema version of a component, 0 when it was never installed.
fn get_schema_version(conn: &Connection, component: &str) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            component TEXT PRIMARY KEY,
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM schema_version WHERE component = ?1",
            [component],
            |row| row.get(0),
        )
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, component: &str, version: i32) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO schema_version (component, version) VALUES (?1, ?2)
         ON CONFLICT(component) DO UPDATE SET version = excluded.version",
        rusqlite::params![component, version],
    )
    .map_err(|e| schema_error("Failed to set schema_version", e))?;
    Ok(())
}

/// Primary table. `AUTOINCREMENT` keeps ids of deleted tasks from being reused.
fn create_tasks_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name_en TEXT,
            name_ar TEXT,
            status INTEGER,
            code TEXT
        );",
    )
    .map_err(|e| schema_error("Failed to create tasks table", e))
}

/// Index table. The `*_norm` columns hold lowercased text for matching and
/// `document` holds the full JSON snapshot returned to callers.
fn create_task_documents_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS task_documents (
            id INTEGER PRIMARY KEY,
            name_en TEXT,
            name_ar TEXT,
            status INTEGER,
            code TEXT,
            name_en_norm TEXT,
            name_ar_norm TEXT,
            code_norm TEXT,
            document TEXT NOT NULL,
            indexed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_task_documents_status ON task_documents(status);
        CREATE INDEX IF NOT EXISTS idx_task_documents_code ON task_documents(code_norm);",
    )
    .map_err(|e| schema_error("Failed to create task_documents table", e))
}
