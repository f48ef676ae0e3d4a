//! Repository for the `usage_logs` table.

use mlcloud_core::types::{DbId, OwnerId};
use sqlx::{PgExecutor, PgPool};

use crate::models::usage_log::{CreateUsageLog, UsageLog, UsageTotal};

/// Column list for the `usage_logs` table.
const COLUMNS: &str =
    "id, owner_id, resource_type, resource_id, usage_amount, cost_amount, created_at";

/// Provides append and reporting queries for usage logs.
pub struct UsageLogRepo;

impl UsageLogRepo {
    /// Append a usage entry.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateUsageLog,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO usage_logs \
                (owner_id, resource_type, resource_id, usage_amount, cost_amount) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(input.owner_id)
        .bind(input.resource_type)
        .bind(input.resource_id)
        .bind(input.usage_amount)
        .bind(input.cost_amount)
        .fetch_one(executor)
        .await
    }

    /// Most recent entries for an owner.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: OwnerId,
        limit: i64,
    ) -> Result<Vec<UsageLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM usage_logs \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, UsageLog>(&query)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Totals per resource type for an owner.
    pub async fn totals_for_owner(
        pool: &PgPool,
        owner_id: OwnerId,
    ) -> Result<Vec<UsageTotal>, sqlx::Error> {
        sqlx::query_as::<_, UsageTotal>(
            "SELECT resource_type, \
                    COUNT(*) AS entries, \
                    SUM(usage_amount) AS usage_amount, \
                    SUM(cost_amount) AS cost_amount \
             FROM usage_logs \
             WHERE owner_id = $1 \
             GROUP BY resource_type \
             ORDER BY resource_type",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}
