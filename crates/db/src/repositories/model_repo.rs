//! Repository for the `models` table.

use mlcloud_core::model::ModelStatus;
use mlcloud_core::types::{ModelId, OwnerId};
use sqlx::PgPool;

use crate::models::model::{CreateModel, Model};

/// Column list for the `models` table.
const COLUMNS: &str = "id, owner_id, notebook_id, name, description, model_type, \
    framework_version, model_path, requirements, status, created_at, updated_at";

/// Provides CRUD and status transitions for registered models.
pub struct ModelRepo;

impl ModelRepo {
    /// Register a model trained in one of the owner's notebooks.
    ///
    /// Returns `None` when the notebook does not exist or belongs to someone
    /// else. The ownership check and the insert are a single statement.
    pub async fn create(pool: &PgPool, input: &CreateModel) -> Result<Option<Model>, sqlx::Error> {
        let query = format!(
            "INSERT INTO models \
                (owner_id, notebook_id, name, description, model_type, framework_version, \
                 requirements, status) \
             SELECT $1, n.id, $3, $4, $5, $6, $7, $8 \
             FROM notebooks n WHERE n.id = $2 AND n.owner_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Model>(&query)
            .bind(input.owner_id)
            .bind(input.notebook_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.model_type)
            .bind(&input.framework_version)
            .bind(&input.requirements)
            .bind(ModelStatus::Training.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: ModelId,
        owner_id: OwnerId,
    ) -> Result<Option<Model>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM models WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Model>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's models, newest first.
    pub async fn list_for_owner(pool: &PgPool, owner_id: OwnerId) -> Result<Vec<Model>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM models WHERE owner_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Model>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Move a model from `from` to `to`, recording the artifact path if given.
    ///
    /// Returns `None` when the row is missing, not owned, or no longer in
    /// `from`.
    pub async fn transition_status(
        pool: &PgPool,
        id: ModelId,
        owner_id: OwnerId,
        from: ModelStatus,
        to: ModelStatus,
        model_path: Option<&str>,
    ) -> Result<Option<Model>, sqlx::Error> {
        let query = format!(
            "UPDATE models SET \
                status = $4, \
                model_path = COALESCE($5, model_path), \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Model>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(model_path)
            .fetch_optional(pool)
            .await
    }

    /// Delete a model. Its deployments are removed by `ON DELETE CASCADE`.
    pub async fn delete_owned(
        pool: &PgPool,
        id: ModelId,
        owner_id: OwnerId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM models WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
