//! SQL query builder for task searches.
//!
//! Translates a parsed [`SearchQuery`] into a `WHERE` clause over the
//! `task_documents` table. Text comparisons run against the normalized
//! (lowercased) columns.

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;

use crate::types::{Clause, SearchQuery, TaskField, normalize};

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::String(s) => s.to_sql(),
            SqlParam::Integer(i) => i.to_sql(),
        }
    }
}

impl SqlFragment {
    /// Adds a parameter and returns its placeholder.
    fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Name of the normalized column for a text field.
fn norm_column(field: TaskField) -> &'static str {
    match field {
        TaskField::NameEn => "name_en_norm",
        TaskField::NameAr => "name_ar_norm",
        TaskField::Code => "code_norm",
        TaskField::Id | TaskField::Status => field.column(),
    }
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the `WHERE` clause body for a query.
///
/// Returns an empty fragment when every clause matches all documents.
pub fn build_where(query: &SearchQuery) -> SqlFragment {
    let mut fragment = SqlFragment::default();
    let mut conditions = Vec::new();

    for clause in query.clauses() {
        let condition = match clause {
            Clause::All => continue,
            Clause::IntEquals { field, value } => {
                let p = fragment.add_param(SqlParam::Integer(*value));
                format!("{} = {}", field.column(), p)
            }
            Clause::TextEquals { field, value } => {
                let p = fragment.add_param(SqlParam::String(normalize(value)));
                format!("{} = {}", norm_column(*field), p)
            }
            Clause::TextPrefix { field, prefix } => {
                let pattern = format!("{}%", escape_like(&normalize(prefix)));
                let p = fragment.add_param(SqlParam::String(pattern));
                format!("{} LIKE {} ESCAPE '\\'", norm_column(*field), p)
            }
            Clause::Term(term) => {
                let pattern = format!("%{}%", escape_like(&normalize(term)));
                let p = fragment.add_param(SqlParam::String(pattern));
                let alternatives: Vec<String> = TaskField::TEXT
                    .iter()
                    .map(|f| format!("{} LIKE {} ESCAPE '\\'", norm_column(*f), p))
                    .collect();
                format!("({})", alternatives.join(" OR "))
            }
        };
        conditions.push(condition);
    }

    fragment.sql = conditions.join(" AND ");
    fragment
}
