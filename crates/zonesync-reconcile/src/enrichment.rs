//! Connection enrichment
//!
//! Replaces the four foreign keys of a raw connection with descriptive
//! labels. The original keys and every other field are kept.

use crate::resolver::ReferenceIndexes;
use zonesync_common::{EnrichedConnection, RawConnection};

/// Applies one zone's reference indexes to its connections
#[derive(Debug, Clone)]
pub struct EnrichmentPipeline {
    indexes: ReferenceIndexes,
}

impl EnrichmentPipeline {
    pub fn new(indexes: ReferenceIndexes) -> Self {
        Self { indexes }
    }

    pub fn indexes(&self) -> &ReferenceIndexes {
        &self.indexes
    }

    /// Enrich a single connection. Unresolvable keys yield the sentinel label.
    pub fn enrich(&self, raw: RawConnection) -> EnrichedConnection {
        let fields = raw.fields;
        EnrichedConnection {
            pk: raw.pk,
            model: raw.model,
            city_name: self.indexes.cities.label(fields.city.as_ref()),
            equipment_name: self.indexes.equipment.label(fields.equipment.as_ref()),
            ip_address: self.indexes.ips.label(fields.ip_address.as_ref()),
            node_name: self.indexes.nodes.label(fields.node.as_ref()),
            fields,
        }
    }

    pub fn enrich_all(&self, raws: Vec<RawConnection>) -> Vec<EnrichedConnection> {
        raws.into_iter().map(|raw| self.enrich(raw)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ReferenceIndex;
    use serde_json::json;
    use zonesync_common::{ListingItem, RecordKey, UNKNOWN_REFERENCE};
    use zonesync_upstream::Table;

    fn index(table: Table, value: serde_json::Value) -> ReferenceIndex {
        let items: Vec<ListingItem> = serde_json::from_value(value).unwrap();
        ReferenceIndex::build(table, items)
    }

    fn pipeline() -> EnrichmentPipeline {
        EnrichmentPipeline::new(ReferenceIndexes {
            cities: index(Table::Cities, json!([{"pk": 40, "fields": {"nombre": "Guayaquil"}}])),
            equipment: index(Table::Equipment, json!([{"pk": 7, "fields": {"nombre": "ONU HG8245"}}])),
            ips: index(Table::IpAddresses, json!([{"pk": 77, "fields": {"direccion": "10.0.0.77"}}])),
            nodes: index(Table::Nodes, json!([{"pk": 3, "fields": {"nombre": "Nodo Norte"}}])),
        })
    }

    fn raw(value: serde_json::Value) -> RawConnection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_enrich_resolves_all_labels_and_keeps_fields() {
        let enriched = pipeline().enrich(raw(json!({
            "pk": 9,
            "model": "clientes.cuentasimple",
            "fields": {
                "conector": 55, "ciudad": 40, "equipo_cliente": 7,
                "direccion_ip": 77, "nodo_de_red": 3, "plan": "20M"
            }
        })));

        assert_eq!(enriched.pk, RecordKey::numeric(9));
        assert_eq!(enriched.city_name, "Guayaquil");
        assert_eq!(enriched.equipment_name, "ONU HG8245");
        assert_eq!(enriched.ip_address, "10.0.0.77");
        assert_eq!(enriched.node_name, "Nodo Norte");
        assert_eq!(enriched.fields.city, Some(RecordKey::numeric(40)));
        assert_eq!(enriched.fields.other["plan"], json!("20M"));
        assert_eq!(enriched.connector(), Some(&RecordKey::numeric(55)));
    }

    #[test]
    fn test_unresolved_keys_become_sentinel() {
        let enriched = pipeline().enrich(raw(json!({
            "pk": 10,
            "fields": {"conector": 56, "ciudad": 99, "equipo_cliente": null}
        })));

        assert_eq!(enriched.city_name, UNKNOWN_REFERENCE);
        assert_eq!(enriched.equipment_name, UNKNOWN_REFERENCE);
        assert_eq!(enriched.ip_address, UNKNOWN_REFERENCE);
        assert_eq!(enriched.node_name, UNKNOWN_REFERENCE);
    }

    #[test]
    fn test_enrich_all_preserves_order() {
        let enriched = pipeline().enrich_all(vec![
            raw(json!({"pk": 2, "fields": {}})),
            raw(json!({"pk": 1, "fields": {}})),
        ]);
        let pks: Vec<_> = enriched.iter().map(|c| c.pk.as_str().to_string()).collect();
        assert_eq!(pks, vec!["2", "1"]);
    }
}
