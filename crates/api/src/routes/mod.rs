pub mod deployment;
pub mod health;
pub mod model;
pub mod notebook;
pub mod usage;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /notebooks                        list, create
/// /notebooks/access-url             access URL with token (POST)
/// /notebooks/{id}                   get, delete
/// /notebooks/{id}/start             start (POST)
/// /notebooks/{id}/stop              stop (POST)
/// /notebooks/{id}/status            runtime completion signal (PUT)
///
/// /models                           list, create
/// /models/{id}                      get, delete
/// /models/{id}/status               training completion signal (PUT)
///
/// /deployments                      list, create
/// /deployments/{id}                 get, delete
/// /deployments/{id}/start           start (POST)
/// /deployments/{id}/stop            stop (POST)
/// /deployments/{id}/scale           scaling settings (POST)
/// /deployments/{id}/status          serving runtime signal (PUT)
///
/// /usage                            usage totals and recent entries
/// /usage/pricing                    public price list
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notebooks", notebook::router())
        .nest("/models", model::router())
        .nest("/deployments", deployment::router())
        .nest("/usage", usage::router())
}
