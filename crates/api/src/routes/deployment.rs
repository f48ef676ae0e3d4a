//! Route definitions for the `/deployments` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::deployment;
use crate::state::AppState;

/// Routes mounted at `/deployments`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// DELETE /{id}             -> delete
/// POST   /{id}/start       -> start
/// POST   /{id}/stop        -> stop
/// POST   /{id}/scale       -> scale
/// PUT    /{id}/status      -> report_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(deployment::list).post(deployment::create))
        .route("/{id}", get(deployment::get_by_id).delete(deployment::delete))
        .route("/{id}/start", post(deployment::start))
        .route("/{id}/stop", post(deployment::stop))
        .route("/{id}/scale", post(deployment::scale))
        .route("/{id}/status", put(deployment::report_status))
}
