//! Request extractors whose rejections use the API's JSON error shape.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` that rejects with [`AppError::BadRequest`].
///
/// A missing or mistyped field yields `400 {"error", "code": "BAD_REQUEST"}`
/// instead of axum's plain-text 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
