use axum::routing::{get, put};
use axum::Router;

use crate::handlers::model;
use crate::state::AppState;

/// Routes mounted at `/models`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// DELETE /{id}             -> delete
/// PUT    /{id}/status      -> report_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(model::list).post(model::create))
        .route("/{id}", get(model::get_by_id).delete(model::delete))
        .route("/{id}/status", put(model::report_status))
}
