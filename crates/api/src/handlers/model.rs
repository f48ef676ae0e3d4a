//! Handlers for the `/models` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use mlcloud_core::error::CoreError;
use mlcloud_core::model::{self, ModelStatus};
use mlcloud_core::types::{ModelId, NotebookId, OwnerId};
use mlcloud_db::models::model::{CreateModel, Model};
use mlcloud_db::repositories::ModelRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /models`.
#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    pub notebook_id: NotebookId,
    pub name: String,
    pub description: Option<String>,
    pub model_type: String,
    pub framework_version: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// Body for `PUT /models/{id}/status`, sent by the training job.
#[derive(Debug, Deserialize)]
pub struct ModelStatusReport {
    pub status: ModelStatus,
    pub model_path: Option<String>,
}

/// POST /api/v1/models
///
/// Registers a model from one of the caller's notebooks in `training`.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateModelRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Model>>)> {
    model::validate_model_name(&input.name)?;
    model::validate_model_spec(&input.model_type, &input.requirements)?;

    let created = ModelRepo::create(
        &state.pool,
        &CreateModel {
            owner_id: auth.owner_id,
            notebook_id: input.notebook_id,
            name: input.name.trim().to_string(),
            description: input.description,
            model_type: input.model_type.trim().to_string(),
            framework_version: input.framework_version,
            requirements: input.requirements,
        },
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Notebook",
            id: input.notebook_id.to_string(),
        })
    })?;

    tracing::info!(
        model_id = %created.id,
        notebook_id = %input.notebook_id,
        owner_id = %auth.owner_id,
        "Model registered"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/models
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Model>>>> {
    let models = ModelRepo::list_for_owner(&state.pool, auth.owner_id).await?;
    Ok(Json(DataResponse { data: models }))
}

/// GET /api/v1/models/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> AppResult<Json<DataResponse<Model>>> {
    let model = find_owned(&state, id, auth.owner_id).await?;
    Ok(Json(DataResponse { data: model }))
}

/// DELETE /api/v1/models/{id}
///
/// Deployments of the model are deleted with it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> AppResult<StatusCode> {
    if ModelRepo::delete_owned(&state.pool, id, auth.owner_id).await? {
        tracing::info!(model_id = %id, owner_id = %auth.owner_id, "Model deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// PUT /api/v1/models/{id}/status
pub async fn report_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    AppJson(report): AppJson<ModelStatusReport>,
) -> AppResult<Json<DataResponse<Model>>> {
    let current = find_owned(&state, id, auth.owner_id).await?;
    let from = current.status()?;
    let to = from.complete(report.status)?;

    let updated = ModelRepo::transition_status(
        &state.pool,
        id,
        auth.owner_id,
        from,
        to,
        report.model_path.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Model status changed concurrently (expected {from})"
        )))
    })?;

    tracing::info!(model_id = %id, %from, %to, "Model status changed");
    Ok(Json(DataResponse { data: updated }))
}

fn not_found(id: ModelId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Model",
        id: id.to_string(),
    })
}

pub(crate) async fn find_owned(
    state: &AppState,
    id: ModelId,
    owner_id: OwnerId,
) -> AppResult<Model> {
    ModelRepo::find_owned(&state.pool, id, owner_id)
        .await?
        .ok_or_else(|| not_found(id))
}
