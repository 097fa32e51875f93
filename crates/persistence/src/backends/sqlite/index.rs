//! SQLite-backed search index.
//!
//! Documents are full task snapshots keyed by task id. The index never
//! assigns ids and never holds partial documents: every write replaces the
//! whole row.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::core::{Backend, BackendKind, SearchIndex, SearchProvider};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::types::{Page, PageRequest, SearchQuery, Sort, Task, normalize};

use super::backend::{SqliteBackendConfig, build_pool, ping};
use super::query_builder::{SqlParam, build_where};
use super::schema;

const INDEX_NAME: &str = "sqlite-index";

fn index_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: INDEX_NAME.to_string(),
        message,
        source: None,
    })
}

/// Search index stored in its own SQLite database.
pub struct SqliteSearchIndex {
    pool: Pool<SqliteConnectionManager>,
    is_memory: bool,
}

impl Debug for SqliteSearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSearchIndex")
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

impl SqliteSearchIndex {
    /// Creates an in-memory index.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based index.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Creates an index with custom connection settings.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        let (pool, is_memory) = build_pool(path.as_ref(), &config)?;
        Ok(Self { pool, is_memory })
    }

    /// Initialize the index schema.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_index_schema(&conn)
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    fn get_connection(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: INDEX_NAME.to_string(),
                message: e.to_string(),
            })
        })
    }
}

fn document_to_task(document: String) -> rusqlite::Result<Task> {
    serde_json::from_str(&document).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

#[async_trait]
impl SearchProvider for SqliteSearchIndex {
    async fn search(
        &self,
        query: &SearchQuery,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<Task>> {
        let conn = self.get_connection()?;
        let filter = build_where(query);
        let where_clause = if filter.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", filter.sql)
        };

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM task_documents{}", where_clause),
                params_from_iter(filter.params.iter()),
                |row| row.get(0),
            )
            .map_err(|e| index_error(format!("Failed to count matches: {}", e)))?;

        let default_sort = Sort::default();
        let sort = page.map(|p| &p.sort).unwrap_or(&default_sort);
        let mut sql = format!(
            "SELECT document FROM task_documents{} ORDER BY {}",
            where_clause,
            sort.to_sql()
        );
        let mut params = filter.params.clone();
        if let Some(page) = page {
            params.push(SqlParam::Integer(i64::from(page.size)));
            let limit = params.len();
            params.push(SqlParam::Integer(
                i64::try_from(page.offset()).unwrap_or(i64::MAX),
            ));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", limit, limit + 1));
        }

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| index_error(format!("Failed to prepare search: {}", e)))?;
        let items = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                document_to_task(row.get(0)?)
            })
            .map_err(|e| index_error(format!("Failed to run search '{}': {}", query, e)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64))
    }

    async fn indexed_count(&self) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM task_documents", [], |row| row.get(0))
            .map_err(|e| index_error(format!("Failed to count documents: {}", e)))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    fn index_name(&self) -> &'static str {
        INDEX_NAME
    }

    async fn save(&self, task: &Task) -> StorageResult<()> {
        let id = task.id.ok_or(ResourceError::MissingId)?;
        let document = serde_json::to_string(task)?;
        let conn = self.get_connection()?;

        conn.execute(
            "INSERT INTO task_documents
                (id, name_en, name_ar, status, code, name_en_norm, name_ar_norm, code_norm, document, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name_en = excluded.name_en,
                name_ar = excluded.name_ar,
                status = excluded.status,
                code = excluded.code,
                name_en_norm = excluded.name_en_norm,
                name_ar_norm = excluded.name_ar_norm,
                code_norm = excluded.code_norm,
                document = excluded.document,
                indexed_at = excluded.indexed_at",
            params![
                id,
                task.name_en,
                task.name_ar,
                task.status,
                task.code,
                task.name_en.as_deref().map(normalize),
                task.name_ar.as_deref().map(normalize),
                task.code.as_deref().map(normalize),
                document,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| index_error(format!("Failed to index task {}: {}", id, e)))?;

        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let removed = conn
            .execute("DELETE FROM task_documents WHERE id = ?1", [id])
            .map_err(|e| index_error(format!("Failed to remove task {}: {}", id, e)))?;
        Ok(removed > 0)
    }

    async fn delete_all(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.execute("DELETE FROM task_documents", [])
            .map_err(|e| index_error(format!("Failed to clear index: {}", e)))?;
        Ok(())
    }

    async fn find_all(&self) -> StorageResult<Vec<Task>> {
        Ok(self.search(&SearchQuery::all(), None).await?.items)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>> {
        let conn = self.get_connection()?;
        let task = conn
            .query_row(
                "SELECT document FROM task_documents WHERE id = ?1",
                [id],
                |row| document_to_task(row.get(0)?),
            )
            .optional()
            .map_err(|e| index_error(format!("Failed to read document {}: {}", id, e)))?;
        Ok(task)
    }
}

#[async_trait]
impl Backend for SqliteSearchIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn name(&self) -> &'static str {
        INDEX_NAME
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let conn = self
            .get_connection()
            .map_err(|_| BackendError::Unavailable {
                backend_name: INDEX_NAME.to_string(),
                message: "Failed to get connection".to_string(),
            })?;
        ping(&conn, INDEX_NAME)
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.init_schema().map_err(|e| BackendError::Internal {
            backend_name: INDEX_NAME.to_string(),
            message: format!("Failed to initialize schema: {}", e),
            source: None,
        })
    }
}
