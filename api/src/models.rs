//! API Models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use zonesync_common::{RecordKey, Zone};
use zonesync_provision::ProvisionRequest;
use zonesync_upstream::{ConnectionForm, Table};

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, error: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Upstream status/body or provisioning attempt history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

// ============ Zones ============

/// Configured zone
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ZoneSummary {
    pub id: String,
    /// City code stamped on connections created in this zone
    pub city: Option<i64>,
}

impl From<&Zone> for ZoneSummary {
    fn from(zone: &Zone) -> Self {
        Self { id: zone.id.clone(), city: zone.city_code }
    }
}

/// Catalogs a zone exposes for connection creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogKind {
    Plans,
    Equipment,
    DhcpAccesses,
    Nodes,
    /// IP addresses assignable to a new connection
    IpAddresses,
}

impl From<CatalogKind> for Table {
    fn from(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Plans => Table::Plans,
            CatalogKind::Equipment => Table::Equipment,
            CatalogKind::DhcpAccesses => Table::DhcpAccesses,
            CatalogKind::Nodes => Table::Nodes,
            CatalogKind::IpAddresses => Table::IpAddresses,
        }
    }
}

// ============ Connections ============

/// Connection creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionCreate {
    pub zone: Option<String>,
    /// Form fields forwarded to the zone backend
    #[serde(default)]
    pub form: BTreeMap<String, String>,
    /// Pk of the available IP to assign
    #[schema(value_type = Option<String>)]
    pub ip_pk: Option<RecordKey>,
}

impl ConnectionCreate {
    pub fn into_form(self) -> ConnectionForm {
        ConnectionForm {
            fields: self.form,
            ip_pk: self.ip_pk,
        }
    }
}

// ============ Provisioning ============

/// Device provisioning request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvisionCreate {
    pub zone: String,
    #[schema(value_type = String)]
    pub connection: RecordKey,
    /// Serial as typed by the operator: hex id, vendor code or its last 8 characters
    pub serial: String,
    #[schema(value_type = Option<String>)]
    pub node: Option<RecordKey>,
    /// Profile id; derived from the device vendor when absent
    pub profile: Option<String>,
}

impl From<ProvisionCreate> for ProvisionRequest {
    fn from(body: ProvisionCreate) -> Self {
        Self {
            zone: body.zone,
            connection: body.connection,
            serial: body.serial,
            node: body.node,
            profile: body.profile,
        }
    }
}
