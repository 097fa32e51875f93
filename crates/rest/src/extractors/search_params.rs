//! Search request parameters.

use axum::{extract::FromRequestParts, http::request::Parts};
use tasks_persistence::error::SearchError;
use tasks_persistence::types::SearchQuery;

use super::list_params::{ListParams, query_pairs};
use crate::error::RestError;

/// Axum extractor for `GET /search/tasks`.
///
/// The `query` parameter is required and parsed with [`SearchQuery::parse`];
/// the remaining parameters are the same as for listing.
#[derive(Debug, Clone)]
pub struct SearchParams {
    query: SearchQuery,
    list: ListParams,
}

impl SearchParams {
    /// Builds search parameters from decoded query pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, RestError> {
        let raw = pairs
            .iter()
            .find(|(k, _)| k == "query")
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| SearchError::QueryParseError {
                message: "missing 'query' parameter".to_string(),
            })?;

        Ok(Self {
            query: SearchQuery::parse(raw)?,
            list: ListParams::from_pairs(pairs)?,
        })
    }

    /// Returns the parsed query.
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Returns sorting and paging.
    pub fn list(&self) -> &ListParams {
        &self.list
    }
}

impl<S> FromRequestParts<S> for SearchParams
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = query_pairs(parts, state).await?;
        SearchParams::from_pairs(&pairs)
    }
}
