//! Sorting and pagination types.
//!
//! Sort specifications use the `field,direction` form, for example
//! `nameEn,desc`. Several specifications may be combined; the first one is the
//! primary order. A sort that does not mention `id` gets `id asc` appended so
//! results are deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field::TaskField;
use crate::error::SearchError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    /// The field to sort on.
    pub field: TaskField,
    /// The direction.
    pub direction: SortDirection,
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<SortOrder>,
}

impl Default for Sort {
    fn default() -> Self {
        Self::by_id()
    }
}

impl Sort {
    /// Sorts by id ascending.
    pub fn by_id() -> Self {
        Self {
            orders: vec![SortOrder {
                field: TaskField::Id,
                direction: SortDirection::Asc,
            }],
        }
    }

    /// Builds a sort from explicit keys.
    pub fn new(orders: Vec<SortOrder>) -> Self {
        if orders.is_empty() {
            return Self::by_id();
        }
        Self { orders }
    }

    /// Parses `field[,direction]` specifications.
    ///
    /// An empty list yields the default sort.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::UnknownField` for a field that is not sortable and
    /// `SearchError::InvalidValue` for a direction other than `asc`/`desc`.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, SearchError> {
        let mut orders = Vec::new();
        for spec in specs {
            let spec = spec.as_ref().trim();
            if spec.is_empty() {
                continue;
            }
            let mut parts = spec.split(',').map(str::trim);
            let field = TaskField::parse(parts.next().unwrap_or_default())?;
            let direction = match parts.next() {
                None | Some("") => SortDirection::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(d) => {
                    return Err(SearchError::InvalidValue {
                        field: "sort".to_string(),
                        value: d.to_string(),
                    });
                }
            };
            orders.push(SortOrder { field, direction });
        }
        Ok(Self::new(orders))
    }

    /// The sort keys in priority order.
    pub fn orders(&self) -> &[SortOrder] {
        &self.orders
    }

    /// Renders an SQL `ORDER BY` clause body.
    ///
    /// Column names come from [`TaskField::column`], never from user input.
    pub fn to_sql(&self) -> String {
        let mut clauses: Vec<String> = self
            .orders
            .iter()
            .map(|o| format!("{} {}", o.field.column(), o.direction.sql()))
            .collect();
        if !self.orders.iter().any(|o| o.field == TaskField::Id) {
            clauses.push("id ASC".to_string());
        }
        clauses.join(", ")
    }
}

/// A request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Result ordering.
    pub sort: Sort,
}

impl PageRequest {
    /// Creates a page request with the default sort.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Sort::default(),
        }
    }

    /// A single page holding every result in the given order.
    pub fn everything(sort: Sort) -> Self {
        Self {
            page: 0,
            size: u32::MAX,
            sort,
        }
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Row offset of the first item.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results with the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matches across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Wraps an unpaged result.
    pub fn unpaged(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self { items, total }
    }
}
