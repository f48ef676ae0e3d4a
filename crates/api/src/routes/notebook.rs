//! Route definitions for the `/notebooks` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::notebook;
use crate::state::AppState;

/// Routes mounted at `/notebooks`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// POST   /access-url       -> access_url
/// GET    /{id}             -> get_by_id
/// DELETE /{id}             -> delete
/// POST   /{id}/start       -> start
/// POST   /{id}/stop        -> stop
/// PUT    /{id}/status      -> report_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notebook::list).post(notebook::create))
        .route("/access-url", post(notebook::access_url))
        .route("/{id}", get(notebook::get_by_id).delete(notebook::delete))
        .route("/{id}/start", post(notebook::start))
        .route("/{id}/stop", post(notebook::stop))
        .route("/{id}/status", put(notebook::report_status))
}
