//! Reference table resolution
//!
//! Fetches a zone's four descriptive tables and indexes them by primary key.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use zonesync_common::{ListingItem, RecordKey, SyncResult, Zone, UNKNOWN_REFERENCE};
use zonesync_upstream::{Table, ZoneBackend};

/// Primary key → entry lookup over one reference table
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    table: Table,
    entries: HashMap<RecordKey, ListingItem>,
}

impl ReferenceIndex {
    pub fn build(table: Table, items: Vec<ListingItem>) -> Self {
        let entries = items.into_iter().map(|item| (item.pk.clone(), item)).collect();
        Self { table, entries }
    }

    pub fn get(&self, key: &RecordKey) -> Option<&ListingItem> {
        self.entries.get(key)
    }

    /// Descriptive label of `key`, or the unknown sentinel when the key is
    /// null, absent from the table, or the entry has no label.
    pub fn label(&self, key: Option<&RecordKey>) -> String {
        key.and_then(|k| self.entries.get(k))
            .and_then(|item| item.label(self.table.label_fields()))
            .unwrap_or_else(|| UNKNOWN_REFERENCE.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The four reference indexes of one zone
#[derive(Debug, Clone)]
pub struct ReferenceIndexes {
    pub cities: ReferenceIndex,
    pub equipment: ReferenceIndex,
    pub ips: ReferenceIndex,
    pub nodes: ReferenceIndex,
}

impl ReferenceIndexes {
    /// Indexes with no entries; every lookup yields the sentinel
    pub fn empty() -> Self {
        Self {
            cities: ReferenceIndex::build(Table::Cities, vec![]),
            equipment: ReferenceIndex::build(Table::Equipment, vec![]),
            ips: ReferenceIndex::build(Table::IpAddresses, vec![]),
            nodes: ReferenceIndex::build(Table::Nodes, vec![]),
        }
    }
}

/// Builds a zone's reference indexes
#[derive(Clone)]
pub struct ReferenceResolver {
    backend: Arc<dyn ZoneBackend>,
}

impl ReferenceResolver {
    pub fn new(backend: Arc<dyn ZoneBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the four tables concurrently; any failure aborts the whole resolve.
    pub async fn resolve(&self, zone: &Zone) -> SyncResult<ReferenceIndexes> {
        let (cities, equipment, ips, nodes) = tokio::try_join!(
            self.backend.list_table(zone, Table::Cities),
            self.backend.list_table(zone, Table::Equipment),
            self.backend.list_table(zone, Table::IpAddresses),
            self.backend.list_table(zone, Table::Nodes),
        )?;

        let indexes = ReferenceIndexes {
            cities: ReferenceIndex::build(Table::Cities, cities),
            equipment: ReferenceIndex::build(Table::Equipment, equipment),
            ips: ReferenceIndex::build(Table::IpAddresses, ips),
            nodes: ReferenceIndex::build(Table::Nodes, nodes),
        };
        debug!(
            zone = %zone.id,
            cities = indexes.cities.len(),
            equipment = indexes.equipment.len(),
            ips = indexes.ips.len(),
            nodes = indexes.nodes.len(),
            "reference indexes built"
        );
        Ok(indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zonesync_common::SyncError;
    use tokio_test::{assert_err, assert_ok};
    use zonesync_upstream::InMemoryZoneBackend;

    fn items(value: serde_json::Value) -> Vec<ListingItem> {
        serde_json::from_value(value).unwrap()
    }

    fn zone() -> Zone {
        Zone::new("GTRE01", "memory://gtre01").with_credentials("api", "secret")
    }

    #[test]
    fn test_label_sentinel_cases() {
        let index = ReferenceIndex::build(
            Table::Nodes,
            items(json!([
                {"pk": 1, "fields": {"nombre": "Nodo Norte"}},
                {"pk": 2, "fields": {"activo": true}}
            ])),
        );

        assert_eq!(index.label(Some(&RecordKey::numeric(1))), "Nodo Norte");
        assert_eq!(index.label(Some(&RecordKey::new("1"))), "Nodo Norte");
        assert_eq!(index.label(Some(&RecordKey::numeric(2))), UNKNOWN_REFERENCE);
        assert_eq!(index.label(Some(&RecordKey::numeric(3))), UNKNOWN_REFERENCE);
        assert_eq!(index.label(None), UNKNOWN_REFERENCE);
    }

    #[test]
    fn test_ip_label_prefers_address() {
        let index = ReferenceIndex::build(
            Table::IpAddresses,
            items(json!([{"pk": 5, "fields": {"direccion": "10.20.0.5", "nombre": "pool"}}])),
        );
        assert_eq!(index.label(Some(&RecordKey::numeric(5))), "10.20.0.5");
    }

    #[tokio::test]
    async fn test_resolve_builds_all_four_indexes() {
        let backend = InMemoryZoneBackend::new()
            .with_table("GTRE01", Table::Cities, items(json!([{"pk": 40, "fields": {"nombre": "Guayaquil"}}])))
            .with_table("GTRE01", Table::Nodes, items(json!([
                {"pk": 1, "fields": {"nombre": "A"}},
                {"pk": 2, "fields": {"nombre": "B"}}
            ])));
        let resolver = ReferenceResolver::new(Arc::new(backend));

        let indexes = assert_ok!(resolver.resolve(&zone()).await);

        assert_eq!(indexes.cities.len(), 1);
        assert_eq!(indexes.nodes.len(), 2);
        assert!(indexes.equipment.is_empty());
        assert!(indexes.ips.is_empty());
    }

    #[tokio::test]
    async fn test_one_table_failure_aborts_resolve() {
        let backend = InMemoryZoneBackend::new()
            .with_table("GTRE01", Table::Cities, items(json!([{"pk": 40, "fields": {"nombre": "Guayaquil"}}])))
            .with_failing_table("GTRE01", Table::IpAddresses);
        let resolver = ReferenceResolver::new(Arc::new(backend));

        let err = assert_err!(resolver.resolve(&zone()).await);
        assert!(matches!(err, SyncError::Upstream(ref u) if u.status == Some(500)));
    }
}
