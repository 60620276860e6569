//! HTTP error mapping

use crate::models::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};
use zonesync_common::SyncError;

/// Handler error
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Lookup found nothing
    #[error("{0}")]
    NotFound(String),

    /// Serial is not in the zone's unprovisioned device directory
    #[error("serial {0} is not available")]
    SerialNotAvailable(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, Option<Value>) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            Self::SerialNotAvailable(_) => (StatusCode::CONFLICT, "serial_not_available", None),
            Self::Sync(err) => match err {
                SyncError::ZoneNotFound(_) => (StatusCode::NOT_FOUND, "zone_not_found", None),
                SyncError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request", None),
                SyncError::CredentialsMissing { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "credentials_missing", None)
                }
                SyncError::Config(_) | SyncError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
                }
                SyncError::Upstream(upstream) => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    Some(json!({
                        "service": upstream.service,
                        "status": upstream.status,
                        "body": upstream.body,
                    })),
                ),
                SyncError::ProvisioningExhausted(failure) => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "provisioning_exhausted",
                    Some(json!({
                        "attempts": failure.attempts,
                        "last_response": failure.last_response,
                        "history": failure.history,
                    })),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = self.parts();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, code, "{message}");
        } else {
            warn!(%status, code, "{message}");
        }

        let mut body = ApiResponse::<Value>::error(code, &message);
        if let Some(err) = body.error.as_mut() {
            err.details = details;
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
