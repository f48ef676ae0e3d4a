//! Repository for the `deployments` table.

use mlcloud_core::deployment::DeploymentStatus;
use mlcloud_core::model::ModelStatus;
use mlcloud_core::types::{DeploymentId, OwnerId};
use sqlx::PgPool;

use crate::models::deployment::{CreateDeployment, Deployment};
use crate::models::usage_log::{CreateUsageLog, RESOURCE_DEPLOYMENT};
use crate::repositories::UsageLogRepo;

/// Column list for the `deployments` table.
const COLUMNS: &str = "id, model_id, owner_id, name, api_endpoint, api_key_hash, status, \
    instance_type, auto_scaling, min_instances, max_instances, created_at, updated_at";

/// Provides CRUD, scaling and status transitions for deployments.
pub struct DeploymentRepo;

impl DeploymentRepo {
    /// Insert a deployment and its first usage entry in one transaction.
    ///
    /// The row is only inserted while the model is owned by the caller and
    /// `ready`; otherwise nothing is written and `None` is returned. The
    /// usage entry bills the first hour of `min_instances` instances.
    pub async fn create_with_usage(
        pool: &PgPool,
        input: &CreateDeployment,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO deployments \
                (model_id, owner_id, name, api_endpoint, api_key_hash, status, instance_type, \
                 auto_scaling, min_instances, max_instances) \
             SELECT m.id, $2, $3, $4, $5, $6, $7, $8, $9, $10 \
             FROM models m WHERE m.id = $1 AND m.owner_id = $2 AND m.status = $11 \
             RETURNING {COLUMNS}"
        );
        let deployment = sqlx::query_as::<_, Deployment>(&insert_query)
            .bind(input.model_id)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(&input.api_endpoint)
            .bind(&input.api_key_hash)
            .bind(DeploymentStatus::Deploying.as_str())
            .bind(input.instance_type.as_str())
            .bind(input.auto_scaling)
            .bind(input.min_instances)
            .bind(input.max_instances)
            .bind(ModelStatus::Ready.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(deployment) = deployment else {
            return Ok(None);
        };

        let instances = f64::from(input.min_instances);
        UsageLogRepo::create(
            &mut *tx,
            &CreateUsageLog {
                owner_id: input.owner_id,
                resource_type: RESOURCE_DEPLOYMENT,
                resource_id: deployment.id,
                usage_amount: instances,
                cost_amount: input.instance_type.hourly_cost() * instances,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(deployment))
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: DeploymentId,
        owner_id: OwnerId,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deployments WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's deployments, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: OwnerId,
    ) -> Result<Vec<Deployment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deployments WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Move a deployment from `from` to `to`.
    ///
    /// Returns `None` when the row is missing, not owned, or no longer in
    /// `from`.
    pub async fn transition_status(
        pool: &PgPool,
        id: DeploymentId,
        owner_id: OwnerId,
        from: DeploymentStatus,
        to: DeploymentStatus,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!(
            "UPDATE deployments SET status = $4, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Update the scaling settings. Bounds are validated by the caller.
    pub async fn scale(
        pool: &PgPool,
        id: DeploymentId,
        owner_id: OwnerId,
        auto_scaling: bool,
        min_instances: i32,
        max_instances: i32,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!(
            "UPDATE deployments SET \
                auto_scaling = $3, \
                min_instances = $4, \
                max_instances = $5, \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(auto_scaling)
            .bind(min_instances)
            .bind(max_instances)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete_owned(
        pool: &PgPool,
        id: DeploymentId,
        owner_id: OwnerId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM deployments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
