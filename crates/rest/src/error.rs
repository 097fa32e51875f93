//! Error types for the Tasks REST API.
//!
//! Every error is rendered as an `application/problem+json` body and carries
//! the `X-Tasks-Error` and `X-Tasks-Params` headers so clients can key off a
//! stable error code without parsing the body.
//!
//! # Error Mapping
//!
//! | Error | HTTP Status | Error Key |
//! |-------|-------------|-----------|
//! | IdExists | 400 | idexists |
//! | IdNull | 400 | idnull |
//! | IdInvalid | 400 | idinvalid |
//! | IdNotFound | 400 | idnotfound |
//! | Required | 400 | required |
//! | BadRequest | 400 | caller supplied |
//! | NotFound | 404 | - |
//! | MethodNotAllowed | 405 | - |
//! | UnsupportedMediaType | 415 | - |
//! | InternalError | 500 | - |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use tasks_persistence::error::{
    BackendError, ResourceError, SearchError, StorageError, SyncError, ValidationError,
};

use crate::responses::headers::{ENTITY_NAME, X_TASKS_ERROR, X_TASKS_PARAMS};

/// Media type of error bodies.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// The primary error type for REST API operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RestError {
    /// A create request carried an id (HTTP 400).
    IdExists,

    /// An update request has no body id (HTTP 400).
    IdNull,

    /// The body id does not match the path id (HTTP 400).
    IdInvalid {
        /// Id from the request path.
        path_id: i64,
        /// Id from the request body.
        body_id: i64,
    },

    /// An update targets an id that does not exist (HTTP 400).
    IdNotFound {
        /// The missing id.
        id: i64,
    },

    /// A required field is missing or blank (HTTP 400).
    Required {
        /// JSON name of the field.
        field: String,
    },

    /// Any other malformed request (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
        /// Stable error code.
        error_key: &'static str,
    },

    /// Task not found (HTTP 404).
    NotFound {
        /// The task id.
        id: i64,
    },

    /// Method not allowed on the path (HTTP 405).
    MethodNotAllowed {
        /// The method that was attempted.
        method: String,
        /// The request path.
        path: String,
    },

    /// Unsupported request media type (HTTP 415).
    UnsupportedMediaType {
        /// The unsupported content type.
        content_type: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Creates a bad request error for an unparseable body.
    pub fn invalid_body(message: impl fmt::Display) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", message),
            error_key: "invalidjson",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::IdExists
            | RestError::IdNull
            | RestError::IdInvalid { .. }
            | RestError::IdNotFound { .. }
            | RestError::Required { .. }
            | RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RestError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable error code, if this error has one.
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            RestError::IdExists => Some("idexists"),
            RestError::IdNull => Some("idnull"),
            RestError::IdInvalid { .. } => Some("idinvalid"),
            RestError::IdNotFound { .. } => Some("idnotfound"),
            RestError::Required { .. } => Some("required"),
            RestError::BadRequest { error_key, .. } => Some(*error_key),
            RestError::NotFound { .. }
            | RestError::MethodNotAllowed { .. }
            | RestError::UnsupportedMediaType { .. }
            | RestError::InternalError { .. } => None,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::IdExists => write!(f, "A new task cannot already have an ID"),
            RestError::IdNull => write!(f, "Invalid id"),
            RestError::IdInvalid { path_id, body_id } => {
                write!(f, "Invalid ID: path id {} does not match body id {}", path_id, body_id)
            }
            RestError::IdNotFound { id } => write!(f, "Entity not found: {}", id),
            RestError::Required { field } => write!(f, "Missing required field: {}", field),
            RestError::BadRequest { message, .. } => write!(f, "Bad request: {}", message),
            RestError::NotFound { id } => write!(f, "Task not found: {}", id),
            RestError::MethodNotAllowed { method, path } => {
                write!(f, "Method {} not allowed on {}", method, path)
            }
            RestError::UnsupportedMediaType { content_type } => {
                write!(f, "Content type '{}' is not supported", content_type)
            }
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

/// Problem details body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Problem<'a> {
    #[serde(rename = "type")]
    problem_type: &'a str,
    title: &'a str,
    status: u16,
    detail: String,
    entity_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_key: Option<&'a str>,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_key = self.error_key();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let problem = Problem {
            problem_type: "about:blank",
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            detail: self.to_string(),
            entity_name: ENTITY_NAME,
            error_key,
        };

        let mut response = (status, Json(problem)).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        if let Ok(value) = HeaderValue::from_str(&format!("error.{}", error_key.unwrap_or("http"))) {
            headers.insert(X_TASKS_ERROR, value);
        }
        headers.insert(X_TASKS_PARAMS, HeaderValue::from_static(ENTITY_NAME));
        response
    }
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Validation(e) => e.into(),
            StorageError::Search(e) => e.into(),
            StorageError::Sync(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { id } => RestError::NotFound { id },
            ResourceError::AlreadyExists { .. } => RestError::IdExists,
            ResourceError::MissingId => RestError::IdNull,
        }
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingRequiredField { field } => RestError::Required { field },
            ValidationError::InvalidTask { message } => RestError::BadRequest {
                message,
                error_key: "invalid",
            },
        }
    }
}

impl From<SearchError> for RestError {
    fn from(err: SearchError) -> Self {
        let error_key = match err {
            SearchError::QueryParseError { .. } => "badquery",
            SearchError::UnknownField { .. } | SearchError::InvalidValue { .. } => "badsort",
            SearchError::InvalidPage { .. } => "badpage",
        };
        RestError::BadRequest {
            message: err.to_string(),
            error_key,
        }
    }
}

impl From<SyncError> for RestError {
    fn from(err: SyncError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::invalid_body(err)
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;
