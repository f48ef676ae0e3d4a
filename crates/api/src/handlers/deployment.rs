//! Handlers for the `/deployments` resource.
//!
//! A deployment serves a `ready` model behind a generated endpoint. The API
//! key is returned once, at creation; only its hash is stored.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use mlcloud_core::deployment::{
    self, DeploymentAction, DeploymentStatus, EndpointCredentials, InstanceType,
};
use mlcloud_core::error::CoreError;
use mlcloud_core::types::{DeploymentId, ModelId, OwnerId};
use mlcloud_db::models::deployment::{CreateDeployment, Deployment};
use mlcloud_db::repositories::DeploymentRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::model;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body for `POST /deployments`.
#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub model_id: ModelId,
    pub name: String,
    pub instance_type: String,
    #[serde(default)]
    pub auto_scaling: bool,
    #[serde(default = "default_min_instances")]
    pub min_instances: i32,
    #[serde(default = "default_max_instances")]
    pub max_instances: i32,
}

fn default_min_instances() -> i32 {
    1
}

fn default_max_instances() -> i32 {
    5
}

/// A new deployment with its one-time API key.
#[derive(Debug, Serialize)]
pub struct CreatedDeployment {
    pub deployment: Deployment,
    pub api_key: String,
}

/// Body for `POST /deployments/{id}/scale`. Omitted fields keep their value.
#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub auto_scaling: Option<bool>,
    pub min_instances: Option<i32>,
    pub max_instances: Option<i32>,
}

/// Body for `PUT /deployments/{id}/status`, sent by the serving runtime.
#[derive(Debug, Deserialize)]
pub struct DeploymentStatusReport {
    pub status: DeploymentStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/deployments
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateDeploymentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedDeployment>>)> {
    deployment::validate_deployment_name(&input.name)?;
    let instance_type: InstanceType = input.instance_type.parse()?;
    deployment::validate_scaling(input.min_instances, input.max_instances)?;

    let model = model::find_owned(&state, input.model_id, auth.owner_id).await?;
    model.status()?.ensure_deployable()?;

    let creds = EndpointCredentials::generate();
    let created = DeploymentRepo::create_with_usage(
        &state.pool,
        &CreateDeployment {
            model_id: model.id,
            owner_id: auth.owner_id,
            name: input.name.trim().to_string(),
            api_endpoint: creds.api_endpoint,
            api_key_hash: creds.api_key_hash,
            instance_type,
            auto_scaling: input.auto_scaling,
            min_instances: input.min_instances,
            max_instances: input.max_instances,
        },
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Model {} changed while deploying",
            model.id
        )))
    })?;

    tracing::info!(
        deployment_id = %created.id,
        model_id = %model.id,
        owner_id = %auth.owner_id,
        instance_type = %instance_type,
        "Deployment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedDeployment {
                deployment: created,
                api_key: creds.api_key,
            },
        }),
    ))
}

/// GET /api/v1/deployments
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Deployment>>>> {
    let deployments = DeploymentRepo::list_for_owner(&state.pool, auth.owner_id).await?;
    Ok(Json(DataResponse { data: deployments }))
}

/// GET /api/v1/deployments/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
) -> AppResult<Json<DataResponse<Deployment>>> {
    let deployment = find_owned(&state, id, auth.owner_id).await?;
    Ok(Json(DataResponse { data: deployment }))
}

/// DELETE /api/v1/deployments/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
) -> AppResult<StatusCode> {
    if DeploymentRepo::delete_owned(&state.pool, id, auth.owner_id).await? {
        tracing::info!(deployment_id = %id, owner_id = %auth.owner_id, "Deployment deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/deployments/{id}/start
pub async fn start(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
) -> AppResult<Json<DataResponse<Deployment>>> {
    apply_action(&state, id, auth.owner_id, DeploymentAction::Start).await
}

/// POST /api/v1/deployments/{id}/stop
pub async fn stop(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
) -> AppResult<Json<DataResponse<Deployment>>> {
    apply_action(&state, id, auth.owner_id, DeploymentAction::Stop).await
}

/// PUT /api/v1/deployments/{id}/status
pub async fn report_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
    AppJson(report): AppJson<DeploymentStatusReport>,
) -> AppResult<Json<DataResponse<Deployment>>> {
    let current = find_owned(&state, id, auth.owner_id).await?;
    let from = current.status()?;
    let to = from.complete(report.status)?;

    let updated = transition(&state, id, auth.owner_id, from, to).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/deployments/{id}/scale
pub async fn scale(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DeploymentId>,
    AppJson(input): AppJson<ScaleRequest>,
) -> AppResult<Json<DataResponse<Deployment>>> {
    let current = find_owned(&state, id, auth.owner_id).await?;
    let auto_scaling = input.auto_scaling.unwrap_or(current.auto_scaling);
    let min_instances = input.min_instances.unwrap_or(current.min_instances);
    let max_instances = input.max_instances.unwrap_or(current.max_instances);
    deployment::validate_scaling(min_instances, max_instances)?;

    let updated = DeploymentRepo::scale(
        &state.pool,
        id,
        auth.owner_id,
        auto_scaling,
        min_instances,
        max_instances,
    )
    .await?
    .ok_or_else(|| not_found(id))?;

    tracing::info!(
        deployment_id = %id,
        auto_scaling,
        min_instances,
        max_instances,
        "Deployment scaled"
    );
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DeploymentId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Deployment",
        id: id.to_string(),
    })
}

async fn find_owned(
    state: &AppState,
    id: DeploymentId,
    owner_id: OwnerId,
) -> AppResult<Deployment> {
    DeploymentRepo::find_owned(&state.pool, id, owner_id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn apply_action(
    state: &AppState,
    id: DeploymentId,
    owner_id: OwnerId,
    action: DeploymentAction,
) -> AppResult<Json<DataResponse<Deployment>>> {
    let current = find_owned(state, id, owner_id).await?;
    let from = current.status()?;
    let to = from.apply(action)?;

    let updated = transition(state, id, owner_id, from, to).await?;
    Ok(Json(DataResponse { data: updated }))
}

async fn transition(
    state: &AppState,
    id: DeploymentId,
    owner_id: OwnerId,
    from: DeploymentStatus,
    to: DeploymentStatus,
) -> AppResult<Deployment> {
    let updated = DeploymentRepo::transition_status(&state.pool, id, owner_id, from, to)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Deployment status changed concurrently (expected {from})"
            )))
        })?;

    tracing::info!(deployment_id = %id, %from, %to, "Deployment status changed");
    Ok(updated)
}
