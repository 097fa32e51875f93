//! Tasks route configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tasks_persistence::core::{IndexMaintenance, SearchProvider, TaskStorage};

use crate::handlers;
use crate::state::AppState;

/// Creates all Tasks REST API routes.
///
/// # Routes
///
/// ## Resource
/// - `GET /tasks` - List
/// - `POST /tasks` - Create
/// - `PUT /tasks`, `PATCH /tasks` - 405
/// - `GET /tasks/{id}` - Read
/// - `PUT /tasks/{id}` - Update
/// - `PATCH /tasks/{id}` - Merge-patch
/// - `DELETE /tasks/{id}` - Delete
///
/// ## Search
/// - `GET /search/tasks?query=...` - Search the index
///
/// ## Operations
/// - `GET /health` - Health check
/// - `POST /admin/search/reconcile` - Repair the index
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: TaskStorage + SearchProvider + IndexMaintenance + Send + Sync + 'static,
{
    Router::new()
        // Resource routes
        .route(
            "/tasks",
            get(handlers::list_handler::<S>)
                .post(handlers::create_handler::<S>)
                .put(handlers::collection_write_handler)
                .patch(handlers::collection_write_handler),
        )
        .route(
            "/tasks/{id}",
            get(handlers::read_handler::<S>)
                .put(handlers::update_handler::<S>)
                .patch(handlers::patch_handler::<S>)
                .delete(handlers::delete_handler::<S>),
        )
        // Search
        .route("/search/tasks", get(handlers::search_handler::<S>))
        // Operations
        .route("/health", get(handlers::health_handler::<S>))
        .route(
            "/admin/search/reconcile",
            post(handlers::reconcile_handler::<S>),
        )
        // State
        .with_state(state)
}
