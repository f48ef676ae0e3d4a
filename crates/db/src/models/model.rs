//! Registered model row and insert DTO.

use mlcloud_core::error::CoreError;
use mlcloud_core::model::ModelStatus;
use mlcloud_core::types::{ModelId, NotebookId, OwnerId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `models` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Model {
    pub id: ModelId,
    pub owner_id: OwnerId,
    pub notebook_id: Option<NotebookId>,
    pub name: String,
    pub description: Option<String>,
    pub model_type: String,
    pub framework_version: Option<String>,
    pub model_path: Option<String>,
    pub requirements: Vec<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Model {
    pub fn status(&self) -> Result<ModelStatus, CoreError> {
        self.status.parse()
    }
}

/// Insert DTO for a new model. Models always start in `training`.
#[derive(Debug, Clone)]
pub struct CreateModel {
    pub owner_id: OwnerId,
    pub notebook_id: NotebookId,
    pub name: String,
    pub description: Option<String>,
    pub model_type: String,
    pub framework_version: Option<String>,
    pub requirements: Vec<String>,
}
