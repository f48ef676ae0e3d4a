//! Deployment row and insert DTO.

use mlcloud_core::deployment::{DeploymentStatus, InstanceType};
use mlcloud_core::error::CoreError;
use mlcloud_core::types::{DeploymentId, ModelId, OwnerId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `deployments` table.
///
/// `api_key_hash` never leaves the server.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub model_id: ModelId,
    pub owner_id: OwnerId,
    pub name: String,
    pub api_endpoint: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub status: String,
    pub instance_type: String,
    pub auto_scaling: bool,
    pub min_instances: i32,
    pub max_instances: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Deployment {
    pub fn status(&self) -> Result<DeploymentStatus, CoreError> {
        self.status.parse()
    }
}

/// Insert DTO for a new deployment.
#[derive(Debug, Clone)]
pub struct CreateDeployment {
    pub model_id: ModelId,
    pub owner_id: OwnerId,
    pub name: String,
    pub api_endpoint: String,
    pub api_key_hash: String,
    pub instance_type: InstanceType,
    pub auto_scaling: bool,
    pub min_instances: i32,
    pub max_instances: i32,
}
