use serde_json::{Map, Value};

/// Ordered set of (object type, object) pairs handed to the renderers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectCollection {
    entries: Vec<(String, Value)>,
}

impl ObjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding a single object
    pub fn single(object_type: impl Into<String>, object: Value) -> Self {
        let mut collection = Self::new();
        collection.push(object_type, object);
        collection
    }

    pub fn push(&mut self, object_type: impl Into<String>, object: Value) {
        self.entries.push((object_type.into(), object));
    }

    /// Entries in encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(t, o)| (t.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `{ "<type>": [object, ...] }` grouped by first encounter of each type
    pub fn to_json(&self) -> Value {
        let mut grouped = Map::new();
        for (object_type, object) in &self.entries {
            let slot = grouped
                .entry(object_type.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(object.clone());
            }
        }
        Value::Object(grouped)
    }
}

/// Read the `name` field of an object, if it is a string
pub fn object_name(object: &Value) -> Option<&str> {
    object.get("name").and_then(|n| n.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iteration_preserves_encounter_order() {
        let mut collection = ObjectCollection::new();
        collection.push("virtualservice", json!({"name": "vs1"}));
        collection.push("pool", json!({"name": "p1"}));
        collection.push("virtualservice", json!({"name": "vs2"}));

        let types: Vec<&str> = collection.iter().map(|(t, _)| t).collect();
        assert_eq!(types, vec!["virtualservice", "pool", "virtualservice"]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_to_json_groups_by_type() {
        let mut collection = ObjectCollection::new();
        collection.push("virtualservice", json!({"name": "vs1"}));
        collection.push("pool", json!({"name": "p1"}));
        collection.push("virtualservice", json!({"name": "vs2"}));

        let dump = collection.to_json();
        assert_eq!(
            dump,
            json!({
                "virtualservice": [{"name": "vs1"}, {"name": "vs2"}],
                "pool": [{"name": "p1"}]
            })
        );
        let keys: Vec<&String> = dump.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["virtualservice", "pool"]);
    }

    #[test]
    fn test_object_name() {
        assert_eq!(object_name(&json!({"name": "foo"})), Some("foo"));
        assert_eq!(object_name(&json!({"name": 3})), None);
        assert_eq!(object_name(&json!({})), None);
    }
}
