//! Handlers for the `/notebooks` resource and notebook access URLs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use mlcloud_core::error::CoreError;
use mlcloud_core::notebook::{self, GpuType, NotebookAction, NotebookStatus};
use mlcloud_core::types::{NotebookId, OwnerId, Timestamp};
use mlcloud_db::models::notebook::{CreateNotebook, Notebook};
use mlcloud_db::repositories::NotebookRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body for `POST /notebooks`.
#[derive(Debug, Deserialize)]
pub struct CreateNotebookRequest {
    pub name: String,
    pub gpu_type: String,
}

/// A freshly created notebook and its one-time access URL.
#[derive(Debug, Serialize)]
pub struct CreatedNotebook {
    pub notebook: Notebook,
    pub access_url: String,
    pub token_expires_at: Timestamp,
}

/// Body for `PUT /notebooks/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusReport {
    pub status: NotebookStatus,
    pub container_id: Option<String>,
}

/// Body for `POST /notebooks/access-url`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessUrlRequest {
    pub notebook_id: String,
}

/// Response for `POST /notebooks/access-url`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessUrlResponse {
    pub success: bool,
    pub access_url: String,
    pub port: i32,
    pub expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/notebooks
///
/// The notebook, its access token and the usage entry are written together.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateNotebookRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedNotebook>>)> {
    notebook::validate_notebook_name(&input.name)?;
    let gpu_type: GpuType = input.gpu_type.parse()?;

    let jupyter_url = notebook::jupyter_base_url(&state.config.tokens.notebook_domain, auth.owner_id);
    let sealed = state.token_service().seal_new(auth.owner_id, Utc::now())?;

    let created = NotebookRepo::create_with_token(
        &state.pool,
        &CreateNotebook {
            owner_id: auth.owner_id,
            name: input.name.trim().to_string(),
            gpu_type,
            jupyter_port: notebook::allocate_jupyter_port(),
            jupyter_url,
        },
        &sealed,
    )
    .await?;

    tracing::info!(
        notebook_id = %created.id,
        owner_id = %auth.owner_id,
        gpu_type = %gpu_type,
        port = created.jupyter_port,
        "Notebook created"
    );

    let issued = sealed.into_issued();
    let access_url = notebook::access_url(&created.jupyter_url, issued.token.expose());
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedNotebook {
                notebook: created,
                access_url,
                token_expires_at: issued.expires_at,
            },
        }),
    ))
}

/// GET /api/v1/notebooks
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Notebook>>>> {
    let notebooks = NotebookRepo::list_for_owner(&state.pool, auth.owner_id).await?;
    Ok(Json(DataResponse { data: notebooks }))
}

/// GET /api/v1/notebooks/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<NotebookId>,
) -> AppResult<Json<DataResponse<Notebook>>> {
    let notebook = find_owned(&state, id, auth.owner_id).await?;
    Ok(Json(DataResponse { data: notebook }))
}

/// DELETE /api/v1/notebooks/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<NotebookId>,
) -> AppResult<StatusCode> {
    if NotebookRepo::delete_owned(&state.pool, id, auth.owner_id).await? {
        tracing::info!(notebook_id = %id, owner_id = %auth.owner_id, "Notebook deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/notebooks/{id}/start
pub async fn start(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<NotebookId>,
) -> AppResult<Json<DataResponse<Notebook>>> {
    apply_action(&state, id, auth.owner_id, NotebookAction::Start).await
}

/// POST /api/v1/notebooks/{id}/stop
pub async fn stop(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<NotebookId>,
) -> AppResult<Json<DataResponse<Notebook>>> {
    apply_action(&state, id, auth.owner_id, NotebookAction::Stop).await
}

/// PUT /api/v1/notebooks/{id}/status
///
/// Completion signal from the container runtime for a pending transition.
pub async fn report_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<NotebookId>,
    AppJson(report): AppJson<StatusReport>,
) -> AppResult<Json<DataResponse<Notebook>>> {
    let current = find_owned(&state, id, auth.owner_id).await?;
    let from = current.status()?;
    let to = from.complete(report.status)?;

    let updated = transition(&state, id, auth.owner_id, from, to, report.container_id.as_deref())
        .await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/notebooks/access-url
///
/// Returns the notebook's Jupyter URL with its access token, minting a
/// token if none is stored.
pub async fn access_url(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<AccessUrlRequest>,
) -> AppResult<Json<AccessUrlResponse>> {
    let id: NotebookId = input.notebook_id.trim().parse().map_err(|_| {
        AppError::Core(CoreError::NotFound {
            entity: "Notebook",
            id: input.notebook_id.clone(),
        })
    })?;

    let notebook = find_owned(&state, id, auth.owner_id).await?;
    let issued = state.token_service().resolve(id, auth.owner_id).await?;

    tracing::info!(
        notebook_id = %id,
        owner_id = %auth.owner_id,
        minted = issued.minted,
        expires_at = %issued.expires_at,
        "Issued notebook access URL"
    );

    Ok(Json(AccessUrlResponse {
        success: true,
        access_url: notebook::access_url(&notebook.jupyter_url, issued.token.expose()),
        port: notebook.jupyter_port,
        expires_at: issued.expires_at,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: NotebookId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Notebook",
        id: id.to_string(),
    })
}

async fn find_owned(state: &AppState, id: NotebookId, owner_id: OwnerId) -> AppResult<Notebook> {
    NotebookRepo::find_owned(&state.pool, id, owner_id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn apply_action(
    state: &AppState,
    id: NotebookId,
    owner_id: OwnerId,
    action: NotebookAction,
) -> AppResult<Json<DataResponse<Notebook>>> {
    let current = find_owned(state, id, owner_id).await?;
    let from = current.status()?;
    let to = from.apply(action)?;

    let updated = transition(state, id, owner_id, from, to, None).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// Conditional status update; losing to a concurrent transition is a conflict.
async fn transition(
    state: &AppState,
    id: NotebookId,
    owner_id: OwnerId,
    from: NotebookStatus,
    to: NotebookStatus,
    container_id: Option<&str>,
) -> AppResult<Notebook> {
    let updated = NotebookRepo::transition_status(&state.pool, id, owner_id, from, to, container_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Notebook status changed concurrently (expected {from})"
            )))
        })?;

    tracing::info!(notebook_id = %id, %from, %to, "Notebook status changed");
    Ok(updated)
}
