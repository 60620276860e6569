//! zonesync HTTP API
//!
//! REST surface over the reconciliation engine and the provisioning service.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         zonesync API                              │
//! │      /api/v1  │  OpenAPI + Swagger UI  │  CORS  │  Trace          │
//! │                                                                   │
//! │  ┌──────────────────────┐          ┌───────────────────────────┐  │
//! │  │ ReconciliationJoiner │          │   ProvisioningService     │  │
//! │  │ zone / all / cedula  │          │ match → profile → retry   │  │
//! │  └──────────┬───────────┘          └─────────────┬─────────────┘  │
//! │             │                                    │                │
//! │  ┌──────────▼───────────┐          ┌─────────────▼─────────────┐  │
//! │  │   CentralClient      │          │   ZoneBackendClient       │  │
//! │  │   Api-Key, paged     │          │   Basic auth per zone     │  │
//! │  └──────────────────────┘          └───────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod routes;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use zonesync_common::{ProvisioningConfig, ServiceConfig, SyncResult, ZoneRegistry};
use zonesync_provision::ProvisioningService;
use zonesync_reconcile::ReconciliationJoiner;
use zonesync_upstream::{CentralClient, SubscriberSource, ZoneBackend, ZoneBackendClient};

pub use error::{ApiError, ApiResult};
pub use models::*;

/// API state
#[derive(Clone)]
pub struct ApiState {
    /// Configured zones
    pub registry: ZoneRegistry,
    /// Zone backend used for catalogs, directories and connection creation
    pub backend: Arc<dyn ZoneBackend>,
    /// Reconciliation engine
    pub joiner: Arc<ReconciliationJoiner>,
    /// Device provisioning
    pub provisioning: Arc<ProvisioningService>,
}

impl ApiState {
    /// Wire the engines over the given upstreams
    pub fn new(
        registry: ZoneRegistry,
        subscribers: Arc<dyn SubscriberSource>,
        backend: Arc<dyn ZoneBackend>,
        provisioning: &ProvisioningConfig,
    ) -> Self {
        let joiner = ReconciliationJoiner::new(registry.clone(), subscribers, backend.clone());
        let provisioning =
            ProvisioningService::from_config(registry.clone(), backend.clone(), provisioning);
        Self {
            registry,
            backend,
            joiner: Arc::new(joiner),
            provisioning: Arc::new(provisioning),
        }
    }

    /// Build the live HTTP upstreams described by `config`
    pub fn from_config(config: &ServiceConfig) -> SyncResult<Self> {
        let central = CentralClient::new(
            &config.central.base_url,
            &config.central_api_key()?,
            &config.http,
        )?
        .with_page_size(config.central.page_size);
        let backend = ZoneBackendClient::new(&config.http, config.routes.clone())?;

        Ok(Self::new(
            config.zone_registry(),
            Arc::new(central),
            Arc::new(backend),
            &config.provisioning,
        ))
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zonesync API",
        version = "0.1.0",
        description = "Subscriber/zone reconciliation and device provisioning",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::zones::list_zones,
        routes::zones::list_catalog,
        routes::zones::list_node_devices,
        routes::clients::list_clients,
        routes::clients::list_zone_clients,
        routes::clients::get_by_national_id,
        routes::connections::create_connection,
        routes::provisioning::provision_device,
    ),
    components(
        schemas(
            ErrorResponse, ZoneSummary, CatalogKind,
            ConnectionCreate, ProvisionCreate,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "zones", description = "Zones, catalogs and device directories"),
        (name = "clients", description = "Reconciled subscriber views"),
        (name = "connections", description = "Connection creation"),
        (name = "provisioning", description = "Device provisioning")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/zones", routes::zones::router())
        .nest("/clients", routes::clients::router())
        .nest("/connections", routes::connections::router())
        .nest("/provisioning", routes::provisioning::router())
}
