//! The `Task` entity.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// JSON name of the English name field.
pub const FIELD_NAME_EN: &str = "nameEn";

/// JSON name of the Arabic name field.
pub const FIELD_NAME_AR: &str = "nameAr";

/// A task record.
///
/// A task without an `id` is transient. The primary store assigns the id on
/// first save and the id never changes afterwards.
///
/// Equality compares every field, which is how index snapshots are checked
/// against the primary record.
///
/// # Examples
///
/// ```
/// use tasks_persistence::types::Task;
///
/// let task = Task::new()
///     .name_en("Inventory")
///     .name_ar("جرد")
///     .status(1)
///     .code("INV-1");
///
/// assert!(task.is_transient());
/// assert!(task.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Identity assigned by the primary store.
    pub id: Option<i64>,

    /// English display name. Required.
    pub name_en: Option<String>,

    /// Arabic display name. Required.
    pub name_ar: Option<String>,

    /// Numeric status code.
    pub status: Option<i32>,

    /// Free-form code.
    pub code: Option<String>,
}

impl Task {
    /// Creates an empty transient task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the English name.
    pub fn name_en(mut self, name_en: impl Into<String>) -> Self {
        self.name_en = Some(name_en.into());
        self
    }

    /// Sets the Arabic name.
    pub fn name_ar(mut self, name_ar: impl Into<String>) -> Self {
        self.name_ar = Some(name_ar.into());
        self
    }

    /// Sets the status code.
    pub fn status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Returns true if the task has not been persisted yet.
    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    /// Checks the required fields.
    ///
    /// `nameEn` and `nameAr` must be present and non-empty. Fields are checked
    /// in declaration order and the first failure is reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(FIELD_NAME_EN, self.name_en.as_deref())?;
        require(FIELD_NAME_AR, self.name_ar.as_deref())?;
        Ok(())
    }

    /// Returns the value of a text field by its JSON name.
    pub fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_NAME_EN => self.name_en.as_deref(),
            FIELD_NAME_AR => self.name_ar.as_deref(),
            "code" => self.code.as_deref(),
            _ => None,
        }
    }
}

fn require(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingRequiredField {
            field: field.to_string(),
        }),
    }
}
