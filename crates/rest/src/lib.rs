//! # tasks-rest - Tasks REST API
//!
//! This crate exposes the Tasks resource over HTTP: create, read, list,
//! update, merge-patch, delete and search. Writes and reads by id go to the
//! primary store; search goes to the index, which follows the primary store
//! within a bounded consistency window.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tasks_rest::{create_app_with_config, ServerConfig};
//! use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};
//! use tasks_persistence::composite::CompositeStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!
//!     let primary = SqliteBackend::open(&config.database_url)?;
//!     primary.init_schema()?;
//!     let index = SqliteSearchIndex::open(&config.index_url)?;
//!     index.init_schema()?;
//!
//!     let storage = CompositeStorage::new(config.to_sync_config(), Arc::new(primary), Arc::new(index));
//!     let app = create_app_with_config(storage, config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | create | POST | `/tasks` |
//! | list | GET | `/tasks?sort=&page=&size=` |
//! | read | GET | `/tasks/{id}` |
//! | update | PUT | `/tasks/{id}` |
//! | patch | PATCH | `/tasks/{id}` |
//! | delete | DELETE | `/tasks/{id}` |
//! | search | GET | `/search/tasks?query=` |
//! | health | GET | `/health` |
//! | reconcile | POST | `/admin/search/reconcile` |
//!
//! ## HTTP Headers
//!
//! - `X-Tasks-Alert` / `X-Tasks-Params` - Set on successful writes
//! - `X-Tasks-Error` - Stable error code on failures (`error.idexists`, ...)
//! - `X-Total-Count` - Total matches on paged list and search responses
//! - `Location` - URI of a created task
//!
//! ## Error Handling
//!
//! Errors are returned as `application/problem+json` bodies:
//!
//! | HTTP Status | Description |
//! |-------------|-------------|
//! | 400 | Identity, validation, query, sort or paging error |
//! | 404 | Task not found |
//! | 405 | Method not allowed |
//! | 415 | Unsupported media type |
//! | 500 | Storage failure |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and problem responses
//! - [`config`] - Server configuration
//! - [`state`] - Application state (storage, configuration)
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`extractors`] - Axum extractors for bodies and query parameters
//! - [`responses`] - Response header generation
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, http::StatusCode};
use tasks_persistence::core::{IndexMaintenance, SearchProvider, TaskStorage};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<S>(storage: S) -> Router
where
    S: TaskStorage + SearchProvider + IndexMaintenance + Send + Sync + 'static,
{
    create_app_with_config(storage, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// Sets up every route together with tracing, request timeout, body size
/// limit and (when enabled) CORS.
pub fn create_app_with_config<S>(storage: S, config: ServerConfig) -> Router
where
    S: TaskStorage + SearchProvider + IndexMaintenance + Send + Sync + 'static,
{
    info!(
        "Creating Tasks REST API with backend: {}",
        storage.backend_name()
    );

    let state = AppState::new(Arc::new(storage), config.clone());
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ));

    let router = router.layer(DefaultBodyLimit::max(config.max_body_size));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    // Browser clients only see custom response headers that are exposed
    cors.expose_headers([
        responses::headers::X_TASKS_ALERT,
        responses::headers::X_TASKS_ERROR,
        responses::headers::X_TASKS_PARAMS,
        responses::headers::X_TOTAL_COUNT,
    ])
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` overrides
/// the given level when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tasks_rest={level},tasks_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
