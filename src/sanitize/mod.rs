//! Sanitation of a fetched controller object
//!
//! Strips identity and ephemeral fields from every mapping in the tree and
//! rewrites absolute API references into their portable `?name=` form.

pub mod reference;
pub mod skip_fields;

pub use reference::{PortableReference, rewrite_reference};
pub use skip_fields::SkipFieldSet;

use serde_json::{Map, Value};

/// Recursive sanitation pass over a configuration tree
pub struct Sanitizer {
    skip_fields: SkipFieldSet,
}

impl Sanitizer {
    pub fn new(skip_fields: SkipFieldSet) -> Self {
        Self { skip_fields }
    }

    /// Produce a sanitized copy of `tree`. The input is left untouched.
    pub fn sanitize(&self, tree: &Value) -> Value {
        match tree {
            Value::Object(map) => {
                let mut cleaned = Map::with_capacity(map.len());
                for (key, value) in map {
                    if self.skip_fields.contains(key) {
                        continue;
                    }
                    cleaned.insert(key.clone(), self.sanitize(value));
                }
                Value::Object(cleaned)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.sanitize(v)).collect()),
            Value::String(s) => Value::String(rewrite_reference(s)),
            other => other.clone(),
        }
    }

    pub fn skip_fields(&self) -> &SkipFieldSet {
        &self.skip_fields
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(SkipFieldSet::default())
    }
}
