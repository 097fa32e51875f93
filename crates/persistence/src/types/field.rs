//! Field names shared by sorting and search queries.

use std::fmt;

use crate::error::SearchError;

/// A sortable and searchable field of [`Task`](super::Task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    /// `id`
    Id,
    /// `nameEn`
    NameEn,
    /// `nameAr`
    NameAr,
    /// `status`
    Status,
    /// `code`
    Code,
}

impl TaskField {
    /// All fields in declaration order.
    pub const ALL: [TaskField; 5] = [
        TaskField::Id,
        TaskField::NameEn,
        TaskField::NameAr,
        TaskField::Status,
        TaskField::Code,
    ];

    /// Text fields, the ones a bare search term is matched against.
    pub const TEXT: [TaskField; 3] = [TaskField::NameEn, TaskField::NameAr, TaskField::Code];

    /// Parses a JSON field name.
    pub fn parse(name: &str) -> Result<Self, SearchError> {
        match name {
            "id" => Ok(TaskField::Id),
            "nameEn" => Ok(TaskField::NameEn),
            "nameAr" => Ok(TaskField::NameAr),
            "status" => Ok(TaskField::Status),
            "code" => Ok(TaskField::Code),
            other => Err(SearchError::UnknownField {
                field: other.to_string(),
            }),
        }
    }

    /// The name used in JSON bodies and query strings.
    pub fn json_name(&self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::NameEn => "nameEn",
            TaskField::NameAr => "nameAr",
            TaskField::Status => "status",
            TaskField::Code => "code",
        }
    }

    /// The column holding this field in both SQLite schemas.
    pub fn column(&self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::NameEn => "name_en",
            TaskField::NameAr => "name_ar",
            TaskField::Status => "status",
            TaskField::Code => "code",
        }
    }

    /// Returns true for integer-valued fields.
    pub fn is_integer(&self) -> bool {
        matches!(self, TaskField::Id | TaskField::Status)
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_json_name() {
        for field in TaskField::ALL {
            assert_eq!(TaskField::parse(field.json_name()).unwrap(), field);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!(
            TaskField::parse("nameen"),
            Err(SearchError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_integer_fields() {
        assert!(TaskField::Id.is_integer());
        assert!(TaskField::Status.is_integer());
        assert!(!TaskField::Code.is_integer());
    }
}
