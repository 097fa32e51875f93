//! Common test utilities for REST API testing.
//!
//! - [`harness`] - Test server over in-memory stores
//! - [`fixtures`] - Task bodies
//! - [`assertions`] - HTTP response assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod harness;
