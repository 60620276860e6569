//! Device provisioning endpoint

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, ErrorResponse, ProvisionCreate};
use crate::ApiState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use zonesync_provision::ProvisionOutcome;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", post(provision_device))
}

/// Attach a device and profile to a connection
#[utoipa::path(
    post,
    path = "/api/v1/provisioning",
    request_body = ProvisionCreate,
    responses(
        (status = 200, description = "Device provisioned; `recovered` marks runs that needed 3+ attempts"),
        (status = 400, description = "No usable profile", body = ErrorResponse),
        (status = 409, description = "Serial not in the node's device directory", body = ErrorResponse),
        (status = 504, description = "Attempt budget exhausted", body = ErrorResponse)
    ),
    tag = "provisioning"
)]
pub async fn provision_device(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<ProvisionCreate>,
) -> ApiResult<ProvisionOutcome> {
    match state.provisioning.provision(input.into()).await? {
        ProvisionOutcome::SerialNotAvailable { serial } => Err(ApiError::SerialNotAvailable(serial)),
        provisioned => Ok(Json(ApiResponse::success(provisioned))),
    }
}
