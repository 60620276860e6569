//! Attribute merge
//!
//! Reconciled clients are the union of a subscriber record and an enriched
//! connection record. Both sides may carry the same attribute name; the merge
//! here is total and the overlay always wins.

use serde::Serialize;
use serde_json::{Map, Value};

/// Flat attribute map as exchanged with upstream services
pub type AttributeMap = Map<String, Value>;

/// Merge two attribute maps, `overlay` wins on overlapping keys.
///
/// Keys only present in `base` are kept, keys only present in `overlay` are
/// added.
pub fn merge_attributes(base: AttributeMap, overlay: AttributeMap) -> AttributeMap {
    let mut merged = base;
    for (key, value) in overlay {
        merged.insert(key, value);
    }
    merged
}

/// Serialize a record into a flat attribute map.
///
/// Records that do not serialize to a JSON object yield an empty map.
pub fn to_attributes<T: Serialize>(record: &T) -> AttributeMap {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(_) => AttributeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "record did not serialize to an attribute map");
            AttributeMap::new()
        }
    }
}
