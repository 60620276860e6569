//! Shared HTTP plumbing

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use zonesync_common::{HttpConfig, SyncError, SyncResult, UpstreamError};

pub(crate) fn build_client(config: &HttpConfig) -> SyncResult<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))
}

/// Read a response body, failing on non-2xx with status and body attached.
pub(crate) async fn read_body(
    service: &str,
    url: &str,
    response: Result<Response, reqwest::Error>,
) -> SyncResult<String> {
    let response = response.map_err(|e| UpstreamError::transport(service, url, e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| UpstreamError::transport(service, url, e))?;

    if !status.is_success() {
        return Err(UpstreamError::status(service, url, status.as_u16(), body).into());
    }
    Ok(body)
}

/// Read and decode a JSON response.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &str,
    url: &str,
    response: Result<Response, reqwest::Error>,
) -> SyncResult<T> {
    let body = read_body(service, url, response).await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::transport(service, url, e).into())
}
