//! Repository for the `notebook_tokens` table.

use mlcloud_core::token_service::NewTokenRecord;
use mlcloud_core::types::{DbId, NotebookId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::notebook_token::NotebookToken;

/// Column list for the `notebook_tokens` table.
const COLUMNS: &str =
    "id, notebook_id, owner_id, encrypted_token, token_hash, expires_at, created_at";

/// Name of the one-token-per-notebook constraint.
pub const UNIQUE_NOTEBOOK_CONSTRAINT: &str = "uq_notebook_tokens_notebook_id";

/// Provides storage for encrypted notebook access tokens.
pub struct NotebookTokenRepo;

impl NotebookTokenRepo {
    /// Insert a token row. Fails with a unique violation on
    /// [`UNIQUE_NOTEBOOK_CONSTRAINT`] if the notebook already has one.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        record: &NewTokenRecord,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO notebook_tokens \
                (notebook_id, owner_id, encrypted_token, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(record.notebook_id)
        .bind(record.owner_id)
        .bind(&record.encrypted_token)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .fetch_one(executor)
        .await
    }

    /// Find the token row for a notebook.
    pub async fn find_by_notebook(
        pool: &PgPool,
        notebook_id: NotebookId,
    ) -> Result<Option<NotebookToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notebook_tokens WHERE notebook_id = $1");
        sqlx::query_as::<_, NotebookToken>(&query)
            .bind(notebook_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a notebook's token row only if it has expired by `now`.
    pub async fn delete_expired_for_notebook(
        pool: &PgPool,
        notebook_id: NotebookId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notebook_tokens WHERE notebook_id = $1 AND expires_at <= $2")
                .bind(notebook_id)
                .bind(now)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every token row that expired by `now`. Returns the number removed.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notebook_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
