//! Connection creation endpoint

use crate::error::ApiResult;
use crate::models::{ApiResponse, ConnectionCreate, ErrorResponse};
use crate::ApiState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use zonesync_common::SyncError;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", post(create_connection))
}

/// Create a connection in a zone backend
#[utoipa::path(
    post,
    path = "/api/v1/connections",
    request_body = ConnectionCreate,
    responses(
        (status = 200, description = "Backend payload of the created connection"),
        (status = 400, description = "Zone or IP missing", body = ErrorResponse),
        (status = 404, description = "Unknown zone", body = ErrorResponse),
        (status = 502, description = "Zone backend failed", body = ErrorResponse)
    ),
    tag = "connections"
)]
pub async fn create_connection(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<ConnectionCreate>,
) -> ApiResult<Value> {
    let zone_id = input
        .zone
        .clone()
        .filter(|z| !z.trim().is_empty())
        .ok_or_else(|| SyncError::InvalidRequest("zone not provided".into()))?;
    if input.ip_pk.is_none() {
        return Err(SyncError::InvalidRequest("available IP not provided".into()).into());
    }

    let zone = state.registry.get(&zone_id)?;
    let created = state.backend.create_connection(zone, &input.into_form()).await?;
    info!(zone = %zone.id, "connection created");
    Ok(Json(ApiResponse::success(created)))
}
