//! Route configuration for the Tasks REST API.

pub mod task_routes;

pub use task_routes::create_routes;
