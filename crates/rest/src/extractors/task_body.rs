//! Request body extractors.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header},
};
use serde_json::Value;
use tasks_persistence::types::Task;

use crate::error::RestError;

/// Media type of merge-patch documents.
pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Returns the essence of the request content type, if one was sent.
fn content_type(headers: &HeaderMap) -> Result<Option<mime::Mime>, RestError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(None);
    };
    let raw = value.to_str().unwrap_or_default();
    raw.parse::<mime::Mime>()
        .map(Some)
        .map_err(|_| RestError::UnsupportedMediaType {
            content_type: raw.to_string(),
        })
}

/// Axum extractor for a task sent as JSON.
///
/// A missing `Content-Type` is treated as JSON; any type whose subtype or
/// suffix is not `json` is rejected with 415.
///
/// # Example
///
/// ```rust,ignore
/// use tasks_rest::extractors::TaskBody;
///
/// async fn create_handler(TaskBody(task): TaskBody) {
///     println!("{:?}", task.name_en);
/// }
/// ```
#[derive(Debug)]
pub struct TaskBody(pub Task);

impl<S> FromRequest<S> for TaskBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(media) = content_type(req.headers())? {
            let is_json = media.subtype() == mime::JSON || media.suffix() == Some(mime::JSON);
            if !is_json {
                return Err(RestError::UnsupportedMediaType {
                    content_type: media.essence_str().to_string(),
                });
            }
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(RestError::invalid_body)?;

        let task: Task = serde_json::from_slice(&bytes)?;
        Ok(TaskBody(task))
    }
}

/// Axum extractor for a merge-patch document (RFC 7386).
///
/// Accepts `application/merge-patch+json` and plain `application/json`; any
/// other content type is rejected with 415. The document must be a JSON object.
#[derive(Debug)]
pub struct MergePatchBody(pub Value);

impl<S> FromRequest<S> for MergePatchBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let accepted = match content_type(req.headers())? {
            Some(media) => {
                media.essence_str() == MERGE_PATCH_JSON
                    || media.essence_str() == mime::APPLICATION_JSON.essence_str()
            }
            None => false,
        };
        if !accepted {
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string();
            return Err(RestError::UnsupportedMediaType { content_type });
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(RestError::invalid_body)?;

        let document: Value = serde_json::from_slice(&bytes)?;
        if !document.is_object() {
            return Err(RestError::BadRequest {
                message: "merge-patch document must be a JSON object".to_string(),
                error_key: "invalidjson",
            });
        }
        Ok(MergePatchBody(document))
    }
}
