//! Response formatting utilities.
//!
//! - [`headers`] - Alert, location and paging headers

pub mod headers;

pub use headers::TaskHeaders;
