//! Reconciled client endpoints

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, ErrorResponse};
use crate::ApiState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use zonesync_common::{LookupOutcome, ReconciledClient};
use zonesync_reconcile::NationalIdMatch;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_clients))
        .route("/national-id/:national_id", get(get_by_national_id))
}

fn client_list(clients: Vec<ReconciledClient>) -> Json<ApiResponse<Vec<ReconciledClient>>> {
    let response = if clients.is_empty() {
        ApiResponse::success(clients).with_message("no reconciled clients")
    } else {
        ApiResponse::success(clients)
    };
    Json(response)
}

/// Reconciled clients across every zone
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    responses(
        (status = 200, description = "Subscribers joined with their zone connections"),
        (status = 502, description = "An upstream call failed", body = ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn list_clients(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<ReconciledClient>> {
    let clients = state.joiner.reconcile_all().await?;
    Ok(client_list(clients))
}

/// Reconciled clients of one zone
#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone}/clients",
    params(("zone" = String, Path, description = "Zone id")),
    responses(
        (status = 200, description = "Subscribers of the zone joined with their connections"),
        (status = 404, description = "Unknown zone", body = ErrorResponse),
        (status = 502, description = "An upstream call failed", body = ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn list_zone_clients(
    State(state): State<Arc<ApiState>>,
    Path(zone): Path<String>,
) -> ApiResult<Vec<ReconciledClient>> {
    let clients = state.joiner.reconcile_zone(&zone).await?;
    Ok(client_list(clients))
}

/// Every contract held under a national id, with connection diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/clients/national-id/{national_id}",
    params(("national_id" = String, Path, description = "Subscriber national id")),
    responses(
        (status = 200, description = "One client/diagnostic pair per contract"),
        (status = 404, description = "No subscriber or connection", body = ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn get_by_national_id(
    State(state): State<Arc<ApiState>>,
    Path(national_id): Path<String>,
) -> ApiResult<Vec<NationalIdMatch>> {
    match state.joiner.lookup_national_id(&national_id).await? {
        LookupOutcome::Found(matches) => Ok(Json(ApiResponse::success(matches))),
        LookupOutcome::NotFound { reason } => Err(ApiError::NotFound(reason)),
    }
}
