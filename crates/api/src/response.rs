//! Shared response envelope types for API handlers.
//!
//! Resource endpoints wrap payloads as `{ "data": ... }`. The access URL
//! endpoint keeps its own flat shape for dashboard compatibility.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
