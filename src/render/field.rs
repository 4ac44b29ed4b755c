use serde_json::Value;

use crate::sanitize::PortableReference;

/// Marker in a field name denoting a reference to another object
pub const REFERENCE_MARKER: &str = "_ref";

/// Shape of a sanitized field, computed once per field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind<'a> {
    /// Mapping or sequence
    Nested(&'a Value),
    /// Reference field whose value is a portable reference
    Reference(PortableReference),
    /// Any other string, number, boolean or null
    Scalar(&'a Value),
}

impl<'a> FieldKind<'a> {
    pub fn classify(field_name: &str, value: &'a Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => FieldKind::Nested(value),
            Value::String(s) if is_reference_field(field_name) => {
                match PortableReference::parse(s) {
                    Some(reference) => FieldKind::Reference(reference),
                    None => FieldKind::Scalar(value),
                }
            }
            _ => FieldKind::Scalar(value),
        }
    }
}

pub fn is_reference_field(field_name: &str) -> bool {
    field_name.contains(REFERENCE_MARKER)
}

/// Uppercase a name into a variable identifier, mapping anything that is not
/// ASCII alphanumeric to `_`.
pub fn variable_name(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_nested() {
        let map = json!({"a": 1});
        let list = json!([1, 2]);
        assert_eq!(FieldKind::classify("servers", &map), FieldKind::Nested(&map));
        assert_eq!(FieldKind::classify("pool_refs", &list), FieldKind::Nested(&list));
    }

    #[test]
    fn test_classify_reference_requires_marker_and_portable_value() {
        let portable = json!("/api/pool/?name=foo_pool");
        match FieldKind::classify("pool_ref", &portable) {
            FieldKind::Reference(r) => {
                assert_eq!(r.object_type, "pool");
                assert_eq!(r.anchor, "foo_pool");
            }
            other => panic!("expected reference, got {:?}", other),
        }

        // Marker without portable value
        let raw = json!("https://h/api/pool/p-1");
        assert_eq!(FieldKind::classify("pool_ref", &raw), FieldKind::Scalar(&raw));

        // Portable value without marker
        assert_eq!(
            FieldKind::classify("description", &portable),
            FieldKind::Scalar(&portable)
        );
    }

    #[test]
    fn test_classify_scalars() {
        let n = json!(80);
        let b = json!(true);
        let null = Value::Null;
        assert_eq!(FieldKind::classify("port", &n), FieldKind::Scalar(&n));
        assert_eq!(FieldKind::classify("enabled", &b), FieldKind::Scalar(&b));
        assert_eq!(FieldKind::classify("cloud_ref", &null), FieldKind::Scalar(&null));
    }

    #[test]
    fn test_variable_name() {
        assert_eq!(variable_name(&["type"]), "TYPE");
        assert_eq!(variable_name(&["pool", "default_server_port"]), "POOL_DEFAULT_SERVER_PORT");
        assert_eq!(variable_name(&["pool", "servers", "0", "ip"]), "POOL_SERVERS_0_IP");
        assert_eq!(variable_name(&["virtualservice", "foo-bar.baz"]), "VIRTUALSERVICE_FOO_BAR_BAZ");
        assert_eq!(variable_name(&["", "name"]), "NAME");
    }
}
