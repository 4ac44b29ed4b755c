use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Field names that identify a specific controller instance of an object
/// rather than its configuration.
pub const DEFAULT_SKIP_FIELDS: [&str; 7] = [
    "uuid",
    "url",
    "ref_key",
    "se_uuids",
    "key_passphrase",
    "extension",
    "_last_modified",
];

/// Immutable set of field names removed at every nesting depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipFieldSet {
    fields: BTreeSet<String>,
}

impl SkipFieldSet {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for SkipFieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_FIELDS)
    }
}
