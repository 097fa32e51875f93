//! Response header generation.
//!
//! Successful writes carry an alert pair so clients can show a notification
//! without inspecting the body:
//!
//! | Header | Value |
//! |--------|-------|
//! | `X-Tasks-Alert` | `tasksApp.tasks.created`, `.updated` or `.deleted` |
//! | `X-Tasks-Params` | The task id |
//!
//! Paged responses carry `X-Total-Count` and creates carry `Location`.

use http::{HeaderMap, HeaderName, HeaderValue, header};

/// Name of the resource in alert and error headers.
pub const ENTITY_NAME: &str = "tasks";

/// Prefix of alert message keys.
pub const APPLICATION_NAME: &str = "tasksApp";

/// Alert message key header.
pub const X_TASKS_ALERT: HeaderName = HeaderName::from_static("x-tasks-alert");

/// Error key header.
pub const X_TASKS_ERROR: HeaderName = HeaderName::from_static("x-tasks-error");

/// Alert or error parameter header.
pub const X_TASKS_PARAMS: HeaderName = HeaderName::from_static("x-tasks-params");

/// Total number of matches for a paged response.
pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// The write that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// A task was created.
    Created,
    /// A task was replaced or patched.
    Updated,
    /// A task was deleted.
    Deleted,
}

impl Alert {
    /// Returns the alert message key, e.g. `tasksApp.tasks.created`.
    pub fn message_key(self) -> String {
        let action = match self {
            Alert::Created => "created",
            Alert::Updated => "updated",
            Alert::Deleted => "deleted",
        };
        format!("{}.{}.{}", APPLICATION_NAME, ENTITY_NAME, action)
    }
}

/// Builder for task response headers.
#[derive(Debug, Default)]
pub struct TaskHeaders {
    alert: Option<(Alert, i64)>,
    location: Option<String>,
    total_count: Option<u64>,
}

impl TaskHeaders {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the alert pair for a write on `id`.
    pub fn with_alert(mut self, alert: Alert, id: i64) -> Self {
        self.alert = Some((alert, id));
        self
    }

    /// Sets the `Location` header.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the `X-Total-Count` header.
    pub fn with_total_count(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Converts to an Axum HeaderMap.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some((alert, id)) = self.alert {
            if let Ok(value) = HeaderValue::from_str(&alert.message_key()) {
                headers.insert(X_TASKS_ALERT, value);
            }
            headers.insert(X_TASKS_PARAMS, HeaderValue::from(id));
        }

        if let Some(location) = &self.location {
            if let Ok(value) = HeaderValue::from_str(location) {
                headers.insert(header::LOCATION, value);
            }
        }

        if let Some(total) = self.total_count {
            headers.insert(X_TOTAL_COUNT, HeaderValue::from(total));
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_message_keys() {
        assert_eq!(Alert::Created.message_key(), "tasksApp.tasks.created");
        assert_eq!(Alert::Updated.message_key(), "tasksApp.tasks.updated");
        assert_eq!(Alert::Deleted.message_key(), "tasksApp.tasks.deleted");
    }

    #[test]
    fn test_header_map() {
        let headers = TaskHeaders::new()
            .with_alert(Alert::Created, 7)
            .with_location("/tasks/7")
            .to_header_map();

        assert_eq!(headers[X_TASKS_ALERT], "tasksApp.tasks.created");
        assert_eq!(headers[X_TASKS_PARAMS], "7");
        assert_eq!(headers[header::LOCATION], "/tasks/7");
        assert!(!headers.contains_key(X_TOTAL_COUNT));
    }

    #[test]
    fn test_total_count_only() {
        let headers = TaskHeaders::new().with_total_count(42).to_header_map();
        assert_eq!(headers[X_TOTAL_COUNT], "42");
        assert!(!headers.contains_key(X_TASKS_ALERT));
    }
}
