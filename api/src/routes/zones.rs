//! Zone, catalog and device directory endpoints

use crate::error::ApiResult;
use crate::models::{ApiResponse, CatalogKind, ErrorResponse, ZoneSummary};
use crate::routes::clients;
use crate::ApiState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::debug;
use zonesync_common::RecordKey;
use zonesync_upstream::{CatalogEntry, DirectoryEntry, Table};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_zones))
        .route("/:zone/clients", get(clients::list_zone_clients))
        .route("/:zone/catalogs/:catalog", get(list_catalog))
        .route("/:zone/nodes/:node/devices", get(list_node_devices))
}

/// Configured zones
#[utoipa::path(
    get,
    path = "/api/v1/zones",
    responses((status = 200, description = "Zones in configuration order", body = [ZoneSummary])),
    tag = "zones"
)]
pub async fn list_zones(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<ZoneSummary>> {
    let zones = state.registry.iter().map(ZoneSummary::from).collect();
    Ok(Json(ApiResponse::success(zones)))
}

/// Plans, customer equipment, DHCP accesses, network nodes or IP addresses of a zone
#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone}/catalogs/{catalog}",
    params(
        ("zone" = String, Path, description = "Zone id"),
        ("catalog" = CatalogKind, Path, description = "plans, equipment, dhcp-accesses, nodes or ip-addresses")
    ),
    responses(
        (status = 200, description = "Catalog entries as {pk, name}"),
        (status = 404, description = "Unknown zone", body = ErrorResponse),
        (status = 502, description = "Zone backend failed", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn list_catalog(
    State(state): State<Arc<ApiState>>,
    Path((zone, catalog)): Path<(String, CatalogKind)>,
) -> ApiResult<Vec<CatalogEntry>> {
    let zone = state.registry.get(&zone)?;
    let table = Table::from(catalog);
    let items = state.backend.list_table(zone, table).await?;
    debug!(zone = %zone.id, table = table.as_str(), items = items.len(), "catalog listed");

    let entries = items.iter().map(|item| CatalogEntry::project(table, item)).collect();
    Ok(Json(ApiResponse::success(entries)))
}

/// Unprovisioned devices available on a network node
#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone}/nodes/{node}/devices",
    params(
        ("zone" = String, Path, description = "Zone id"),
        ("node" = String, Path, description = "Network node pk")
    ),
    responses(
        (status = 200, description = "Device directory of the node"),
        (status = 404, description = "Unknown zone", body = ErrorResponse),
        (status = 502, description = "Zone backend failed", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn list_node_devices(
    State(state): State<Arc<ApiState>>,
    Path((zone, node)): Path<(String, String)>,
) -> ApiResult<Vec<DirectoryEntry>> {
    let zone = state.registry.get(&zone)?;
    let devices = state
        .backend
        .unprovisioned_devices(zone, Some(&RecordKey::new(node)))
        .await?;
    Ok(Json(ApiResponse::success(devices)))
}
