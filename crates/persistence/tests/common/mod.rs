//! Test infrastructure for the persistence layer.
//!
//! Shared helpers for building stores, fixture tasks and an index double that
//! can be told to fail or to hold back writes.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
