//! Zone backend request and response models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use zonesync_common::{BackendRoutes, ListingItem, RecordKey};

/// Zone backend listing tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Cities,
    Equipment,
    IpAddresses,
    Nodes,
    Plans,
    DhcpAccesses,
}

impl Table {
    /// Route of this table's listing
    pub fn route<'a>(&self, routes: &'a BackendRoutes) -> &'a str {
        match self {
            Self::Cities => &routes.cities,
            Self::Equipment => &routes.equipment,
            Self::IpAddresses => &routes.ip_addresses,
            Self::Nodes => &routes.nodes,
            Self::Plans => &routes.plans,
            Self::DhcpAccesses => &routes.dhcp_accesses,
        }
    }

    /// Field names holding the descriptive label, in preference order
    pub fn label_fields(&self) -> &'static [&'static str] {
        match self {
            Self::IpAddresses => &["direccion", "ip", "nombre"],
            _ => &["nombre"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cities => "cities",
            Self::Equipment => "equipment",
            Self::IpAddresses => "ip_addresses",
            Self::Nodes => "nodes",
            Self::Plans => "plans",
            Self::DhcpAccesses => "dhcp_accesses",
        }
    }
}

/// Name shown for catalog entries that carry none
pub const UNNAMED: &str = "Sin nombre";

/// `{pk, name}` projection of a listing item, as offered to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub pk: RecordKey,
    pub name: String,
}

impl CatalogEntry {
    pub fn project(table: Table, item: &ListingItem) -> Self {
        Self {
            pk: item.pk.clone(),
            name: item
                .label(table.label_fields())
                .unwrap_or_else(|| UNNAMED.to_string()),
        }
    }
}

/// Entry of the unprovisioned device directory.
///
/// Backends answer either with plain strings or with `{id, text}` choices;
/// `text` carries the composite device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DirectoryEntryWire")]
pub struct DirectoryEntry {
    pub id: Option<RecordKey>,
    pub text: String,
}

impl DirectoryEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryEntryWire {
    Plain(String),
    Choice {
        #[serde(default)]
        id: Option<RecordKey>,
        text: String,
    },
}

impl From<DirectoryEntryWire> for DirectoryEntry {
    fn from(wire: DirectoryEntryWire) -> Self {
        match wire {
            DirectoryEntryWire::Plain(text) => Self { id: None, text },
            DirectoryEntryWire::Choice { id, text } => Self { id, text },
        }
    }
}

/// Device/profile assignment sent to the provision route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionCommand {
    #[serde(rename = "cuenta")]
    pub connection: RecordKey,
    #[serde(rename = "onu")]
    pub serial: String,
    #[serde(rename = "perfil")]
    pub profile: String,
}

/// Zone backend answer to a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    /// Human-readable message, if the backend sent one
    pub message: Option<String>,
    /// Raw payload
    pub payload: Value,
}

impl BackendReply {
    /// Extract the message from `mensaje`, `message` or `msg`, or the payload
    /// itself when it is a bare string.
    pub fn from_payload(payload: Value) -> Self {
        let message = match &payload {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => ["mensaje", "message", "msg"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        };
        Self { message, payload }
    }
}

/// Subscriber-creation form posted to a zone backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionForm {
    /// Form fields as entered by the operator
    pub fields: BTreeMap<String, String>,
    /// Pk of the available IP address to assign
    pub ip_pk: Option<RecordKey>,
}

impl ConnectionForm {
    /// Encoded form pairs; the IP pk and the zone city code are added unless
    /// the operator already set them.
    pub fn to_pairs(&self, ip_pk: &RecordKey, city_code: Option<i64>) -> Vec<(String, String)> {
        let mut fields = self.fields.clone();
        fields.insert("direccion_ip".into(), ip_pk.to_string());
        if let Some(code) = city_code {
            fields.entry("ciudad".into()).or_insert_with(|| code.to_string());
        }
        fields.into_iter().collect()
    }
}
