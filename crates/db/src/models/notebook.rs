//! Notebook model and DTOs.

use mlcloud_core::error::CoreError;
use mlcloud_core::notebook::{GpuType, NotebookStatus};
use mlcloud_core::types::{NotebookId, OwnerId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notebooks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub owner_id: OwnerId,
    pub name: String,
    pub gpu_type: String,
    pub status: String,
    pub jupyter_port: i32,
    pub jupyter_url: String,
    pub container_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Notebook {
    /// Parsed lifecycle status. The table's CHECK constraint keeps this valid.
    pub fn status(&self) -> Result<NotebookStatus, CoreError> {
        self.status.parse()
    }
}

/// Insert DTO for a new notebook.
#[derive(Debug, Clone)]
pub struct CreateNotebook {
    pub owner_id: OwnerId,
    pub name: String,
    pub gpu_type: GpuType,
    pub jupyter_port: i32,
    pub jupyter_url: String,
}
