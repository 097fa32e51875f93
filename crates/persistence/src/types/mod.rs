//! Core types for the persistence layer.
//!
//! - [`Task`] - The task entity and its validation rules
//! - [`TaskField`] - Field names shared by sorting and search
//! - [`Sort`], [`PageRequest`], [`Page`] - Ordering and pagination
//! - [`SearchQuery`] - The parsed search query language
//!
//! # Examples
//!
//! ```
//! use tasks_persistence::types::{SearchQuery, Sort, Task};
//!
//! let task = Task::new().name_en("Inventory").name_ar("جرد").with_id(1);
//!
//! let query = SearchQuery::parse("nameEn:inv*").unwrap();
//! assert!(query.matches(&task));
//!
//! let sort = Sort::parse(&["nameEn,desc"]).unwrap();
//! assert_eq!(sort.to_sql(), "name_en DESC, id ASC");
//! ```

mod field;
mod pagination;
mod search_query;
mod task;

pub use field::TaskField;
pub use pagination::{Page, PageRequest, Sort, SortDirection, SortOrder};
pub use search_query::{Clause, SearchQuery, normalize};
pub use task::{FIELD_NAME_AR, FIELD_NAME_EN, Task};
