//! Handlers for the `/usage` resource.

use axum::extract::State;
use axum::Json;
use mlcloud_core::deployment::InstanceType;
use mlcloud_core::notebook::GpuType;
use mlcloud_db::models::usage_log::{UsageLog, UsageTotal};
use mlcloud_db::repositories::UsageLogRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of recent entries returned alongside the totals.
const RECENT_LIMIT: i64 = 50;

/// Usage summary for the caller.
#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub totals: Vec<UsageTotal>,
    pub recent: Vec<UsageLog>,
}

/// GET /api/v1/usage
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UsageSummary>>> {
    let totals = UsageLogRepo::totals_for_owner(&state.pool, auth.owner_id).await?;
    let recent = UsageLogRepo::list_for_owner(&state.pool, auth.owner_id, RECENT_LIMIT).await?;
    Ok(Json(DataResponse {
        data: UsageSummary { totals, recent },
    }))
}

/// Hourly price of a notebook GPU tier.
#[derive(Debug, Serialize)]
pub struct NotebookPrice {
    pub gpu_type: GpuType,
    pub price_per_hour: f64,
}

/// Hourly and per-request price of a deployment instance type.
#[derive(Debug, Serialize)]
pub struct DeploymentPrice {
    pub instance_type: InstanceType,
    pub price_per_hour: f64,
    pub price_per_request: f64,
}

#[derive(Debug, Serialize)]
pub struct Pricing {
    pub notebooks: Vec<NotebookPrice>,
    pub deployments: Vec<DeploymentPrice>,
}

/// GET /api/v1/usage/pricing
///
/// Public. Built from the same rates used when usage is recorded.
pub async fn pricing() -> Json<DataResponse<Pricing>> {
    let notebooks = GpuType::ALL
        .into_iter()
        .map(|gpu_type| NotebookPrice {
            gpu_type,
            price_per_hour: gpu_type.hourly_cost(),
        })
        .collect();
    let deployments = InstanceType::ALL
        .into_iter()
        .map(|instance_type| DeploymentPrice {
            instance_type,
            price_per_hour: instance_type.hourly_cost(),
            price_per_request: instance_type.per_request_cost(),
        })
        .collect();
    Json(DataResponse {
        data: Pricing {
            notebooks,
            deployments,
        },
    })
}
