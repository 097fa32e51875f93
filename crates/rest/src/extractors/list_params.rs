//! Sorting and paging parameters.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use tasks_persistence::error::SearchError;
use tasks_persistence::types::{PageRequest, Sort};

use crate::error::{RestError, RestResult};

/// Axum extractor for list parameters.
///
/// `sort=field[,asc|desc]` may repeat; the first occurrence has the highest
/// precedence. `page` and `size` are optional: when neither is given the full
/// result is returned.
///
/// # Example
///
/// ```rust,ignore
/// use tasks_rest::extractors::ListParams;
///
/// async fn list_handler(params: ListParams) {
///     let page = params.page_request(20, 1000)?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    sort: Sort,
    page: Option<u32>,
    size: Option<u32>,
}

impl ListParams {
    /// Builds list parameters from decoded query pairs, ignoring unrelated keys.
    pub fn from_pairs(pairs: &[(String, String)]) -> RestResult<Self> {
        let sorts: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "sort")
            .map(|(_, v)| v.as_str())
            .collect();
        let sort = Sort::parse(&sorts)?;

        Ok(Self {
            sort,
            page: parse_number(pairs, "page")?,
            size: parse_number(pairs, "size")?,
        })
    }

    /// Returns the requested sort.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Returns true when the request asked for a page.
    pub fn is_paged(&self) -> bool {
        self.page.is_some() || self.size.is_some()
    }

    /// Resolves the page request, if any.
    ///
    /// A missing `page` means the first page and a missing `size` means
    /// `default_size`. Sizes above `max_size` are clamped.
    pub fn page_request(&self, default_size: u32, max_size: u32) -> RestResult<Option<PageRequest>> {
        if !self.is_paged() {
            return Ok(None);
        }

        let size = self.size.unwrap_or(default_size).min(max_size);
        if size == 0 {
            return Err(SearchError::InvalidPage {
                message: "size must be at least 1".to_string(),
            }
            .into());
        }

        Ok(Some(
            PageRequest::new(self.page.unwrap_or(0), size).with_sort(self.sort.clone()),
        ))
    }
}

fn parse_number(pairs: &[(String, String)], key: &str) -> RestResult<Option<u32>> {
    let Some((_, raw)) = pairs.iter().find(|(k, _)| k == key) else {
        return Ok(None);
    };
    raw.trim().parse::<u32>().map(Some).map_err(|_| {
        SearchError::InvalidPage {
            message: format!("{} must be a non-negative integer, got '{}'", key, raw),
        }
        .into()
    })
}

/// Decodes the query string into pairs, keeping repeated keys.
pub(crate) async fn query_pairs<S>(parts: &mut Parts, state: &S) -> RestResult<Vec<(String, String)>>
where
    S: Send + Sync,
{
    let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| RestError::BadRequest {
            message: e.body_text(),
            error_key: "badparams",
        })?;
    Ok(pairs)
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = query_pairs(parts, state).await?;
        ListParams::from_pairs(&pairs)
    }
}
