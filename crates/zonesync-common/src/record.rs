//! Subscriber, connection and reference records
//!
//! Types matching the central subscriber service and zone backend payloads.
//! Every record keeps the attributes it does not model in a flattened map, so
//! unrelated fields added upstream pass through untouched.

use crate::merge::{merge_attributes, to_attributes, AttributeMap};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Value used for a foreign key that does not resolve to a reference entry
pub const UNKNOWN_REFERENCE: &str = "Desconocido";

/// Record identifier as sent by upstream services.
///
/// Upstreams send keys as JSON strings or integers. Both forms normalise to
/// the same text, so `7` and `"7"` compare equal. No other coercion applies.
#[derive(Debug, Clone)]
pub struct RecordKey {
    text: String,
    numeric: bool,
}

impl RecordKey {
    /// Key from text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), numeric: false }
    }

    /// Key from an integer
    pub fn numeric(value: i64) -> Self {
        Self { text: value.to_string(), numeric: true }
    }

    /// Normalised text form
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the key carries no characters
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl PartialEq for RecordKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RecordKey {}

impl Hash for RecordKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self::numeric(value)
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.numeric, self.text.parse::<i64>()) {
            (true, Ok(n)) => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = RecordKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordKey, E> {
                Ok(RecordKey::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordKey, E> {
                Ok(RecordKey::new(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordKey, E> {
                Ok(RecordKey::numeric(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordKey, E> {
                i64::try_from(v)
                    .map(RecordKey::numeric)
                    .map_err(|_| E::custom(format!("key {v} out of range")))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

// ============ Central service ============

/// Zone reference embedded in a subscriber record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRef {
    /// Zone name, equal to the zone id used in configuration
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(flatten)]
    pub extra: AttributeMap,
}

/// Subscriber as held by the central subscriber service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    /// Service id, the join key against connection records
    #[serde(rename = "id_servicio", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<RecordKey>,
    /// National id
    #[serde(rename = "cedula", default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<RecordKey>,
    /// Zone the subscriber belongs to
    #[serde(rename = "zona", default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneRef>,
    /// Contact, address and every other attribute
    #[serde(flatten)]
    pub attributes: AttributeMap,
}

impl SubscriberRecord {
    /// Zone name, if the subscriber carries one
    pub fn zone_name(&self) -> Option<&str> {
        self.zone.as_ref().map(|z| z.name.as_str())
    }
}

// ============ Zone backend ============

/// One `{pk, model, fields}` item of a zone backend listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingItem {
    pub pk: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub fields: AttributeMap,
}

impl ListingItem {
    /// First of `candidates` present in `fields` as a non-empty string or number
    pub fn label(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|name| match self.fields.get(*name) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Connection fields of a zone backend connection record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionFields {
    /// Connector key, equal to the subscriber service id
    #[serde(rename = "conector", default)]
    pub connector: Option<RecordKey>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<RecordKey>,
    #[serde(rename = "equipo_cliente", default)]
    pub equipment: Option<RecordKey>,
    #[serde(rename = "direccion_ip", default)]
    pub ip_address: Option<RecordKey>,
    #[serde(rename = "nodo_de_red", default)]
    pub node: Option<RecordKey>,
    #[serde(flatten)]
    pub other: AttributeMap,
}

/// Raw connection record, foreign keys unresolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConnection {
    pub pk: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub fields: ConnectionFields,
}

/// Connection record with foreign keys resolved to descriptive names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedConnection {
    pub pk: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub city_name: String,
    pub equipment_name: String,
    pub ip_address: String,
    pub node_name: String,
    /// Raw fields, connector key included
    #[serde(flatten)]
    pub fields: ConnectionFields,
}

impl EnrichedConnection {
    /// Connector key carried over from the raw record
    pub fn connector(&self) -> Option<&RecordKey> {
        self.fields.connector.as_ref()
    }
}

// ============ Reconciliation ============

/// Subscriber joined with its enriched connection.
///
/// Serializes as one flat attribute map; on overlapping names the connection
/// side wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledClient {
    pub subscriber: SubscriberRecord,
    pub connection: EnrichedConnection,
}

impl ReconciledClient {
    pub fn new(subscriber: SubscriberRecord, connection: EnrichedConnection) -> Self {
        Self { subscriber, connection }
    }

    /// Merged attribute view
    pub fn attributes(&self) -> AttributeMap {
        merge_attributes(to_attributes(&self.subscriber), to_attributes(&self.connection))
    }
}

impl Serialize for ReconciledClient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes().serialize(serializer)
    }
}

/// Result of a lookup where absence is an expected answer
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<T> {
    Found(T),
    NotFound { reason: String },
}

impl<T> LookupOutcome<T> {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound { reason: reason.into() }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_record_key_type_normalisation() {
        let numeric: RecordKey = serde_json::from_value(json!(1042)).unwrap();
        let text: RecordKey = serde_json::from_value(json!("1042")).unwrap();

        assert_eq!(numeric, text);
        let set: HashSet<RecordKey> = [numeric.clone(), text].into_iter().collect();
        assert_eq!(set.len(), 1);

        // numeric keys keep their wire type
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(1042));
        assert_eq!(serde_json::to_value(RecordKey::new("1042")).unwrap(), json!("1042"));
    }

    #[test]
    fn test_record_key_no_trimming() {
        assert_ne!(RecordKey::new(" 7"), RecordKey::numeric(7));
    }

    #[test]
    fn test_subscriber_keeps_unmodelled_attributes() {
        let subscriber: SubscriberRecord = serde_json::from_value(json!({
            "id_servicio": 55,
            "cedula": "0912345678",
            "zona": {"id": 3, "nombre": "GTRE01"},
            "nombre": "Ana",
            "telefono": "0999"
        }))
        .unwrap();

        assert_eq!(subscriber.service_id, Some(RecordKey::numeric(55)));
        assert_eq!(subscriber.zone_name(), Some("GTRE01"));
        assert_eq!(subscriber.attributes["telefono"], json!("0999"));

        let back = serde_json::to_value(&subscriber).unwrap();
        assert_eq!(back["zona"]["id"], json!(3));
        assert_eq!(back["nombre"], json!("Ana"));
    }

    #[test]
    fn test_raw_connection_null_foreign_keys() {
        let raw: RawConnection = serde_json::from_value(json!({
            "pk": 9,
            "model": "clientes.cuentasimple",
            "fields": {"conector": "55", "ciudad": null, "usuario": "pppoe-9"}
        }))
        .unwrap();

        assert_eq!(raw.fields.connector, Some(RecordKey::new("55")));
        assert!(raw.fields.city.is_none());
        assert!(raw.fields.node.is_none());
        assert_eq!(raw.fields.other["usuario"], json!("pppoe-9"));
    }

    #[test]
    fn test_listing_item_label_candidates() {
        let item: ListingItem = serde_json::from_value(json!({
            "pk": 1,
            "fields": {"nombre": "", "direccion": "10.0.0.8"}
        }))
        .unwrap();

        assert_eq!(item.label(&["nombre", "direccion"]), Some("10.0.0.8".into()));
        assert_eq!(item.label(&["ip"]), None);
    }

    #[test]
    fn test_reconciled_client_connection_wins() {
        let subscriber: SubscriberRecord = serde_json::from_value(json!({
            "id_servicio": 55,
            "estado": "Activo",
            "ip_address": "from-subscriber"
        }))
        .unwrap();
        let connection = EnrichedConnection {
            pk: RecordKey::numeric(9),
            model: None,
            city_name: "Guayaquil".into(),
            equipment_name: UNKNOWN_REFERENCE.into(),
            ip_address: "10.1.1.1".into(),
            node_name: "Nodo Norte".into(),
            fields: ConnectionFields {
                connector: Some(RecordKey::new("55")),
                ..Default::default()
            },
        };

        let client = ReconciledClient::new(subscriber, connection);
        let attrs = client.attributes();

        assert_eq!(attrs["ip_address"], json!("10.1.1.1"));
        assert_eq!(attrs["estado"], json!("Activo"));
        assert_eq!(attrs["conector"], json!("55"));
        assert_eq!(attrs["id_servicio"], json!(55));
        assert_eq!(serde_json::to_value(&client).unwrap(), serde_json::Value::Object(attrs));
    }

    #[test]
    fn test_lookup_outcome() {
        let found: LookupOutcome<u8> = LookupOutcome::Found(1);
        assert!(found.is_found());
        assert_eq!(LookupOutcome::<u8>::not_found("gone").found(), None);
    }
}
