//! TaskStorage implementation for SQLite.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use crate::core::TaskStorage;
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::types::{Page, PageRequest, Sort, Task};

use super::SqliteBackend;

const SELECT_COLUMNS: &str = "SELECT id, name_en, name_ar, status, code FROM tasks";

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

pub(crate) fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        name_en: row.get(1)?,
        name_ar: row.get(2)?,
        status: row.get(3)?,
        code: row.get(4)?,
    })
}

#[async_trait]
impl TaskStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, task: Task) -> StorageResult<Task> {
        let conn = self.get_connection()?;

        let id = match task.id {
            None => {
                conn.execute(
                    "INSERT INTO tasks (name_en, name_ar, status, code) VALUES (?1, ?2, ?3, ?4)",
                    params![task.name_en, task.name_ar, task.status, task.code],
                )
                .map_err(|e| internal_error(format!("Failed to insert task: {}", e)))?;
                conn.last_insert_rowid()
            }
            Some(id) => {
                conn.execute(
                    "INSERT INTO tasks (id, name_en, name_ar, status, code)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        name_en = excluded.name_en,
                        name_ar = excluded.name_ar,
                        status = excluded.status,
                        code = excluded.code",
                    params![id, task.name_en, task.name_ar, task.status, task.code],
                )
                .map_err(|e| internal_error(format!("Failed to save task {}: {}", id, e)))?;
                id
            }
        };

        Ok(Task {
            id: Some(id),
            ..task
        })
    }

    async fn update(&self, task: Task) -> StorageResult<Task> {
        let id = task.id.ok_or(StorageError::Resource(ResourceError::MissingId))?;
        let conn = self.get_connection()?;

        let updated = conn
            .execute(
                "UPDATE tasks SET name_en = ?2, name_ar = ?3, status = ?4, code = ?5 WHERE id = ?1",
                params![id, task.name_en, task.name_ar, task.status, task.code],
            )
            .map_err(|e| internal_error(format!("Failed to update task {}: {}", id, e)))?;
        if updated == 0 {
            return Err(StorageError::Resource(ResourceError::NotFound { id }));
        }

        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Task>> {
        let conn = self.get_connection()?;
        let task = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id],
                row_to_task,
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read task {}: {}", id, e)))?;
        Ok(task)
    }

    async fn exists_by_id(&self, id: i64) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )
            .map_err(|e| internal_error(format!("Failed to check task {}: {}", id, e)))?;
        Ok(exists)
    }

    async fn find_all(&self, sort: &Sort) -> StorageResult<Vec<Task>> {
        let conn = self.get_connection()?;
        let sql = format!("{} ORDER BY {}", SELECT_COLUMNS, sort.to_sql());
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let tasks = stmt
            .query_map([], row_to_task)
            .map_err(|e| internal_error(format!("Failed to list tasks: {}", e)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    async fn find_page(&self, request: &PageRequest) -> StorageResult<Page<Task>> {
        let conn = self.get_connection()?;
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count tasks: {}", e)))?;

        let sql = format!(
            "{} ORDER BY {} LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS,
            request.sort.to_sql()
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let items = stmt
            .query_map(params![i64::from(request.size), offset], row_to_task)
            .map_err(|e| internal_error(format!("Failed to page tasks: {}", e)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64))
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let removed = conn
            .execute("DELETE FROM tasks WHERE id = ?1", [id])
            .map_err(|e| internal_error(format!("Failed to delete task {}: {}", id, e)))?;
        Ok(removed > 0)
    }

    async fn delete_all(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.execute("DELETE FROM tasks", [])
            .map_err(|e| internal_error(format!("Failed to delete tasks: {}", e)))?;
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count tasks: {}", e)))?;
        Ok(count as u64)
    }
}
