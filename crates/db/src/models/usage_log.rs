//! Usage log models for the billing view.

use mlcloud_core::types::{DbId, OwnerId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Resource type recorded when a notebook is created.
pub const RESOURCE_NOTEBOOK: &str = "notebook";

/// Resource type recorded when a deployment is created.
pub const RESOURCE_DEPLOYMENT: &str = "deployment";

/// A row from the `usage_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsageLog {
    pub id: DbId,
    pub owner_id: OwnerId,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub usage_amount: f64,
    pub cost_amount: f64,
    pub created_at: Timestamp,
}

/// Per-resource-type totals for one owner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsageTotal {
    pub resource_type: String,
    pub entries: i64,
    pub usage_amount: f64,
    pub cost_amount: f64,
}

/// Insert DTO for a usage log entry.
#[derive(Debug, Clone)]
pub struct CreateUsageLog {
    pub owner_id: OwnerId,
    pub resource_type: &'static str,
    pub resource_id: Uuid,
    pub usage_amount: f64,
    pub cost_amount: f64,
}
