//! Repository for the `notebooks` table.

use mlcloud_core::notebook::NotebookStatus;
use mlcloud_core::token_service::SealedToken;
use mlcloud_core::types::{NotebookId, OwnerId};
use sqlx::PgPool;

use crate::models::notebook::{CreateNotebook, Notebook};
use crate::models::usage_log::{CreateUsageLog, RESOURCE_NOTEBOOK};
use crate::repositories::{NotebookTokenRepo, UsageLogRepo};

/// Column list for the `notebooks` table.
const COLUMNS: &str = "id, owner_id, name, gpu_type, status, jupyter_port, jupyter_url, \
    container_id, created_at, updated_at";

/// Provides CRUD and status transitions for notebooks.
pub struct NotebookRepo;

impl NotebookRepo {
    /// Insert a notebook together with its access token row and usage log.
    ///
    /// All three rows commit or none do, so a notebook never exists without
    /// a token.
    pub async fn create_with_token(
        pool: &PgPool,
        input: &CreateNotebook,
        token: &SealedToken,
    ) -> Result<Notebook, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO notebooks (owner_id, name, gpu_type, status, jupyter_port, jupyter_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let notebook = sqlx::query_as::<_, Notebook>(&insert_query)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(input.gpu_type.as_str())
            .bind(NotebookStatus::Creating.as_str())
            .bind(input.jupyter_port)
            .bind(&input.jupyter_url)
            .fetch_one(&mut *tx)
            .await?;

        NotebookTokenRepo::create(&mut *tx, &token.record(notebook.id, input.owner_id)).await?;

        UsageLogRepo::create(
            &mut *tx,
            &CreateUsageLog {
                owner_id: input.owner_id,
                resource_type: RESOURCE_NOTEBOOK,
                resource_id: notebook.id,
                usage_amount: 1.0,
                cost_amount: input.gpu_type.hourly_cost(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(notebook)
    }

    /// Find a notebook by id, only if it belongs to `owner_id`.
    pub async fn find_owned(
        pool: &PgPool,
        id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<Option<Notebook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notebooks WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Notebook>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a notebook exists and belongs to `owner_id`.
    pub async fn is_owned_by(
        pool: &PgPool,
        id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM notebooks WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }

    /// List an owner's notebooks, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: OwnerId,
    ) -> Result<Vec<Notebook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notebooks WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Notebook>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Move a notebook from `from` to `to`.
    ///
    /// Returns `None` when the row is missing, not owned, or no longer in
    /// `from` (a concurrent transition won). `container_id` is kept when
    /// `None`.
    pub async fn transition_status(
        pool: &PgPool,
        id: NotebookId,
        owner_id: OwnerId,
        from: NotebookStatus,
        to: NotebookStatus,
        container_id: Option<&str>,
    ) -> Result<Option<Notebook>, sqlx::Error> {
        let query = format!(
            "UPDATE notebooks SET \
                status = $4, \
                container_id = COALESCE($5, container_id), \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notebook>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(container_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a notebook. Its token row is removed by `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_owned(
        pool: &PgPool,
        id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notebooks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
