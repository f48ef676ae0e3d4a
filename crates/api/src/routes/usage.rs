use axum::routing::get;
use axum::Router;

use crate::handlers::usage;
use crate::state::AppState;

/// Routes mounted at `/usage`. `/pricing` needs no bearer token.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(usage::summary))
        .route("/pricing", get(usage::pricing))
}
