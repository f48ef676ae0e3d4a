#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use mlcloud_api::auth::jwt::{generate_access_token, JwtConfig};
use mlcloud_api::config::{ServerConfig, TokenConfig};
use mlcloud_api::router::build_app_router;
use mlcloud_api::state::AppState;
use mlcloud_core::types::OwnerId;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
        tokens: TokenConfig {
            encryption_secret: "test-token-secret-0123456789abcdefghij".to_string(),
            ttl_hours: 24,
            purge_interval_secs: 3600,
            notebook_domain: "notebooks.test".to_string(),
        },
    }
}

/// Build the application router exactly as `main.rs` does, over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        token_settings: config.tokens.settings().unwrap(),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// `Authorization` header value for `owner_id`.
pub fn bearer_for(owner_id: OwnerId) -> String {
    let token = generate_access_token(owner_id, &test_config().jwt).unwrap();
    format!("Bearer {token}")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    auth: Option<OwnerId>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner_id) = auth {
        builder = builder.header("Authorization", bearer_for(owner_id));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, owner_id: OwnerId) -> Response<Body> {
    send(app, Method::GET, uri, Some(owner_id), None).await
}

/// Unauthenticated POST with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    owner_id: OwnerId,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(owner_id), Some(body)).await
}

/// Authenticated POST without a body.
pub async fn post_auth(app: Router, uri: &str, owner_id: OwnerId) -> Response<Body> {
    send(app, Method::POST, uri, Some(owner_id), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    owner_id: OwnerId,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(owner_id), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, owner_id: OwnerId) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(owner_id), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
