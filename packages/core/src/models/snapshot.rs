//! Property Snapshots
//!
//! A snapshot is the full property set of an entity (or edge) at a point in
//! time, as returned by the store. Snapshots feed two consumers: the
//! arithmetic resolver, which checks operator semantics against the
//! pre-request values, and the change-event model, which carries the
//! before/after pair to subscribers.

use serde_json::{Map, Value};

/// Full property set of an entity or edge, keyed by field name
pub type Snapshot = Map<String, Value>;

/// Whether the snapshot holds a non-null value for the field
///
/// An absent key and an explicit JSON null are equivalent: arithmetic on
/// either is rejected as a null operand rather than treated as zero.
pub fn has_value(snapshot: &Snapshot, field: &str) -> bool {
    matches!(snapshot.get(field), Some(v) if !v.is_null())
}

/// Extract a snapshot from a store-returned value
///
/// Store rows bind entity variables to JSON objects; anything else (null for
/// an unmatched optional hop, scalars) yields `None`.
pub fn from_value(value: &Value) -> Option<Snapshot> {
    value.as_object().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_value_treats_null_as_absent() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("views".to_string(), json!(10));
        snapshot.insert("rating".to_string(), Value::Null);

        assert!(has_value(&snapshot, "views"));
        assert!(!has_value(&snapshot, "rating"));
        assert!(!has_value(&snapshot, "missing"));
    }

    #[test]
    fn test_from_value() {
        let row = json!({"title": "Jaws", "views": 5});
        let snapshot = from_value(&row).unwrap();
        assert_eq!(snapshot.get("title"), Some(&json!("Jaws")));

        assert!(from_value(&Value::Null).is_none());
        assert!(from_value(&json!(42)).is_none());
    }
}
