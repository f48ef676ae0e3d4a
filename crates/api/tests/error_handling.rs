//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly and need no server or database.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use mlcloud_api::error::AppError;
use mlcloud_core::error::{CoreError, TokenError};
use uuid::Uuid;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Notebook",
        id: "nb-1".to_string(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Notebook with id nb-1 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Notebook name must not be empty".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Missing Authorization header".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Notebook is already running".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Notebook is already running");
}

#[tokio::test]
async fn token_not_found_returns_404() {
    let id = Uuid::new_v4();
    let (status, json) = error_to_response(AppError::Token(TokenError::NotFound(id))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], format!("Notebook with id {id} not found"));
}

#[tokio::test]
async fn token_conflict_returns_409() {
    let (status, json) =
        error_to_response(AppError::Token(TokenError::Conflict(Uuid::new_v4()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn decryption_failure_returns_generic_403() {
    let err = AppError::Token(TokenError::Decryption("authentication tag mismatch"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "ACCESS_DENIED");
    assert!(!json["error"].as_str().unwrap().contains("tag"));
}

#[tokio::test]
async fn token_storage_failure_is_sanitized() {
    let err = AppError::Token(TokenError::Storage("connection refused to 10.0.0.5".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_returns_400_with_message() {
    let err = AppError::BadRequest("missing field `notebookId`".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "missing field `notebookId`");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
