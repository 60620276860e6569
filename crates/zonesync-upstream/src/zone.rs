//! Zone backend client
//!
//! Stateless: the zone's credential pair is encoded on every request and never
//! cached, so a request to one zone can only ever carry that zone's
//! credentials.

use crate::http::{build_client, read_body, read_json};
use crate::model::{BackendReply, ConnectionForm, DirectoryEntry, ProvisionCommand, Table};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};
use zonesync_common::{
    BackendRoutes, Credentials, HttpConfig, ListingItem, RawConnection, RecordKey, SyncError,
    SyncResult, UpstreamError, Zone,
};

/// Operations offered by a zone's network-management backend
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    /// Connection records, optionally narrowed by the backend-side national id search
    async fn list_connections(
        &self,
        zone: &Zone,
        national_id: Option<&str>,
    ) -> SyncResult<Vec<RawConnection>>;

    /// Reference or catalog listing
    async fn list_table(&self, zone: &Zone, table: Table) -> SyncResult<Vec<ListingItem>>;

    /// Diagnostic report of one connection
    async fn diagnostic(&self, zone: &Zone, connection: &RecordKey) -> SyncResult<Value>;

    /// Devices not yet attached to a connection, optionally on one node
    async fn unprovisioned_devices(
        &self,
        zone: &Zone,
        node: Option<&RecordKey>,
    ) -> SyncResult<Vec<DirectoryEntry>>;

    /// Create a connection record
    async fn create_connection(&self, zone: &Zone, form: &ConnectionForm) -> SyncResult<Value>;

    /// Bind a device and profile to a connection
    async fn provision(&self, zone: &Zone, command: &ProvisionCommand) -> SyncResult<BackendReply>;
}

/// `Authorization` header value for a credential pair
pub fn basic_authorization(credentials: &Credentials) -> String {
    let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password()));
    format!("Basic {token}")
}

/// HTTP client for zone backends
pub struct ZoneBackendClient {
    client: Client,
    routes: BackendRoutes,
}

impl ZoneBackendClient {
    /// Create new client
    pub fn new(http: &HttpConfig, routes: BackendRoutes) -> SyncResult<Self> {
        Ok(Self {
            client: build_client(http)?,
            routes,
        })
    }

    pub fn routes(&self) -> &BackendRoutes {
        &self.routes
    }

    /// Authenticated request against `zone`
    fn request(
        &self,
        zone: &Zone,
        method: reqwest::Method,
        route: &str,
    ) -> SyncResult<(String, RequestBuilder)> {
        let credentials = zone.credentials()?;
        let url = zone.url(route);
        debug!(zone = %zone.id, method = %method, url = %url, "zone backend request");

        let builder = self
            .client
            .request(method, &url)
            .header("Authorization", basic_authorization(credentials))
            .header("Accept", "application/json");
        Ok((url, builder))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        zone: &Zone,
        route: &str,
        query: &[(&str, String)],
    ) -> SyncResult<T> {
        let (url, builder) = self.request(zone, reqwest::Method::GET, route)?;
        read_json(&zone.id, &url, builder.query(query).send().await).await
    }
}

#[async_trait]
impl ZoneBackend for ZoneBackendClient {
    async fn list_connections(
        &self,
        zone: &Zone,
        national_id: Option<&str>,
    ) -> SyncResult<Vec<RawConnection>> {
        let query: Vec<(&str, String)> = national_id
            .map(|id| vec![("extra_1", id.to_string())])
            .unwrap_or_default();
        let connections: Vec<RawConnection> =
            self.get_json(zone, &self.routes.connections, &query).await?;
        debug!(zone = %zone.id, count = connections.len(), "listed connections");
        Ok(connections)
    }

    async fn list_table(&self, zone: &Zone, table: Table) -> SyncResult<Vec<ListingItem>> {
        let items: Vec<ListingItem> = self.get_json(zone, table.route(&self.routes), &[]).await?;
        debug!(zone = %zone.id, table = table.as_str(), count = items.len(), "listed table");
        Ok(items)
    }

    async fn diagnostic(&self, zone: &Zone, connection: &RecordKey) -> SyncResult<Value> {
        self.get_json(zone, &self.routes.diagnostic, &[("pk", connection.to_string())])
            .await
    }

    async fn unprovisioned_devices(
        &self,
        zone: &Zone,
        node: Option<&RecordKey>,
    ) -> SyncResult<Vec<DirectoryEntry>> {
        let query: Vec<(&str, String)> = node
            .map(|pk| vec![("nodo_de_red", pk.to_string())])
            .unwrap_or_default();
        self.get_json(zone, &self.routes.unprovisioned_devices, &query)
            .await
    }

    async fn create_connection(&self, zone: &Zone, form: &ConnectionForm) -> SyncResult<Value> {
        let ip_pk = form
            .ip_pk
            .as_ref()
            .ok_or_else(|| SyncError::InvalidRequest("available IP not provided".into()))?;
        let pairs = form.to_pairs(ip_pk, zone.city_code);

        let (url, builder) = self.request(zone, reqwest::Method::POST, &self.routes.create_connection)?;
        let created: Value = read_json(&zone.id, &url, builder.form(&pairs).send().await).await?;
        info!(zone = %zone.id, "connection created");
        Ok(created)
    }

    async fn provision(&self, zone: &Zone, command: &ProvisionCommand) -> SyncResult<BackendReply> {
        let (url, builder) = self.request(zone, reqwest::Method::POST, &self.routes.provision)?;
        let body = read_body(&zone.id, &url, builder.json(command).send().await).await?;

        // Some backends answer writes with plain text
        let payload = serde_json::from_str(&body).unwrap_or(Value::String(body));
        let reply = BackendReply::from_payload(payload);
        if reply.message.is_none() && reply.payload.is_null() {
            return Err(UpstreamError::malformed(&zone.id, &url, "empty provisioning reply").into());
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization_encoding() {
        let creds = Credentials::new("wisp", "p@ss");
        // base64("wisp:p@ss")
        assert_eq!(basic_authorization(&creds), "Basic d2lzcDpwQHNz");
    }

    #[tokio::test]
    async fn test_missing_credentials_never_sends() {
        let client = ZoneBackendClient::new(&HttpConfig::default(), BackendRoutes::default()).unwrap();
        // unroutable port: a request would fail as Upstream, not CredentialsMissing
        let zone = Zone::new("NOCREDS", "http://127.0.0.1:9");

        let err = client.list_table(&zone, Table::Cities).await.unwrap_err();
        assert!(matches!(err, SyncError::CredentialsMissing { zone } if zone == "NOCREDS"));
    }
}
