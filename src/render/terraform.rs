//! Terraform JSON rendering
//!
//! Produces three documents: the provider pin, a flat variable table and the
//! resource blocks. Scalar fields in a resource are replaced by `${var.NAME}`
//! with the original value as the variable default; nested values are
//! embedded as-is.

use serde_json::{Map, Value, json};

use super::field::{FieldKind, variable_name};
use crate::objects::{ObjectCollection, object_name};

pub const USERNAME_VARIABLE: &str = "avi_username";
pub const PASSWORD_VARIABLE: &str = "avi_password";
pub const CONTROLLER_VARIABLE: &str = "avi_controller";
pub const VERSION_VARIABLE: &str = "avi_version";

const DEFAULT_USERNAME: &str = "admin";

/// Provider, variable and resource documents for one run
#[derive(Debug, Clone, PartialEq)]
pub struct TerraformArtifactSet {
    pub provider: Value,
    pub variables: Map<String, Value>,
    pub resource: Map<String, Value>,
}

impl TerraformArtifactSet {
    /// Contents of `provider.tf.json`
    pub fn provider_document(&self) -> Value {
        self.provider.clone()
    }

    /// Contents of `variables.tf.json`
    pub fn variables_document(&self) -> Value {
        json!({ "variable": self.variables })
    }

    /// Contents of `resource.tf.json`
    pub fn resource_document(&self) -> Value {
        json!({ "resource": self.resource })
    }

    /// Look up the default of a variable in the flat table
    #[cfg(test)]
    pub fn variable_default(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).and_then(|v| v.get("default"))
    }
}

pub struct TerraformResourceBuilder {
    prefix: String,
    provider_source: String,
    provider_version: String,
    version_default: String,
    tenant: String,
}

impl TerraformResourceBuilder {
    pub fn new(
        prefix: impl Into<String>,
        provider_source: impl Into<String>,
        provider_version: impl Into<String>,
    ) -> Self {
        let provider_version = provider_version.into();
        Self {
            prefix: prefix.into(),
            provider_source: provider_source.into(),
            version_default: provider_version.clone(),
            provider_version,
            tenant: "admin".to_string(),
        }
    }

    /// Default for the controller API version variable, when it differs from
    /// the provider release pin
    pub fn with_version_default(mut self, version: impl Into<String>) -> Self {
        self.version_default = version.into();
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn build(&self, objects: &ObjectCollection) -> TerraformArtifactSet {
        let mut variables = self.credential_variables();
        let mut resource = Map::new();

        for (index, (object_type, object)) in objects.iter().enumerate() {
            let resource_type = format!("{}_{}", self.prefix, object_type);
            let Value::Object(blocks) = resource
                .entry(resource_type)
                .or_insert_with(|| Value::Object(Map::new()))
            else {
                continue;
            };

            let label = unique_label(blocks, resource_label(object_type, object, index));
            let block = self.resource_block(&label, object, &mut variables);
            blocks.insert(label, Value::Object(block));
        }

        TerraformArtifactSet {
            provider: self.provider_block(),
            variables,
            resource,
        }
    }

    fn credential_variables(&self) -> Map<String, Value> {
        let mut variables = Map::new();
        variables.insert(USERNAME_VARIABLE.to_string(), json!({ "default": DEFAULT_USERNAME }));
        // No default: must be supplied at plan time
        variables.insert(PASSWORD_VARIABLE.to_string(), json!({ "sensitive": true }));
        variables.insert(CONTROLLER_VARIABLE.to_string(), json!({}));
        variables.insert(VERSION_VARIABLE.to_string(), json!({ "default": self.version_default }));
        variables
    }

    fn provider_block(&self) -> Value {
        let mut required = Map::new();
        required.insert(
            self.prefix.clone(),
            json!({
                "source": self.provider_source,
                "version": self.provider_version,
            }),
        );

        let mut provider = Map::new();
        provider.insert(
            self.prefix.clone(),
            json!({
                "avi_username": var_ref(USERNAME_VARIABLE),
                "avi_password": var_ref(PASSWORD_VARIABLE),
                "avi_controller": var_ref(CONTROLLER_VARIABLE),
                "avi_version": var_ref(VERSION_VARIABLE),
                "avi_tenant": self.tenant,
            }),
        );

        json!({
            "terraform": { "required_providers": required },
            "provider": provider,
        })
    }

    fn resource_block(
        &self,
        label: &str,
        object: &Value,
        variables: &mut Map<String, Value>,
    ) -> Map<String, Value> {
        let mut block = Map::new();
        let Value::Object(fields) = object else {
            return block;
        };

        for (field, value) in fields {
            match FieldKind::classify(field, value) {
                FieldKind::Nested(nested) => {
                    // Embedded directly; the placeholder only documents the input
                    let name = variable_name(&[field.as_str()]);
                    variables
                        .entry(name)
                        .or_insert_with(|| json!({ "default": empty_like(nested) }));
                    block.insert(field.clone(), nested.clone());
                }
                FieldKind::Reference(_) | FieldKind::Scalar(_) => {
                    let name = claim_variable(variables, label, field, value);
                    block.insert(field.clone(), Value::String(var_ref(&name)));
                }
            }
        }

        block
    }
}

impl Default for TerraformResourceBuilder {
    fn default() -> Self {
        Self::new("avi", "vmware/avi", crate::config::DEFAULT_API_VERSION)
    }
}

/// Register `value` as a variable default and return the variable name. The
/// plain field name is used unless another object already claimed it with a
/// different default.
fn claim_variable(
    variables: &mut Map<String, Value>,
    label: &str,
    field: &str,
    value: &Value,
) -> String {
    let candidates = [variable_name(&[field]), variable_name(&[label, field])];

    let mut chosen = None;
    for candidate in candidates {
        if is_free_or_same(variables, &candidate, value) {
            chosen = Some(candidate);
            break;
        }
    }

    let name = chosen.unwrap_or_else(|| {
        let base = variable_name(&[label, field]);
        let mut suffix = 2;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if is_free_or_same(variables, &candidate, value) {
                break candidate;
            }
            suffix += 1;
        }
    });

    variables.insert(name.clone(), json!({ "default": value }));
    name
}

fn is_free_or_same(variables: &Map<String, Value>, name: &str, value: &Value) -> bool {
    match variables.get(name) {
        None => true,
        Some(existing) => existing.get("default") == Some(value),
    }
}

fn var_ref(name: &str) -> String {
    format!("${{var.{}}}", name)
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// Terraform block label derived from the object's `name`
fn resource_label(object_type: &str, object: &Value, index: usize) -> String {
    let raw = match object_name(object) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}_{}", object_type, index),
    };

    let mut label: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !label.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        label.insert(0, '_');
    }

    label
}

/// Suffix `label` until no block of the same resource type holds it
fn unique_label(blocks: &Map<String, Value>, label: String) -> String {
    if !blocks.contains_key(&label) {
        return label;
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{}_{}", label, suffix);
        if !blocks.contains_key(&candidate) {
            break candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ObjectCollection {
        ObjectCollection::single(
            "pool",
            json!({
                "name": "foo_pool",
                "type": "pool",
                "default_server_port": 80,
                "tenant_ref": "/api/tenant/?name=admin",
                "servers": [{"ip": {"addr": "10.0.0.10", "type": "V4"}}],
                "analytics_policy": {"enable_realtime_metrics": false}
            }),
        )
    }

    fn block<'a>(set: &'a TerraformArtifactSet, resource_type: &str, label: &str) -> &'a Map<String, Value> {
        set.resource
            .get(resource_type)
            .and_then(|r| r.get(label))
            .and_then(|b| b.as_object())
            .unwrap()
    }

    #[test]
    fn test_scalar_field_becomes_variable_reference() {
        let set = TerraformResourceBuilder::default().build(&pool());
        let pool = block(&set, "avi_pool", "foo_pool");

        assert_eq!(pool.get("type"), Some(&json!("${var.TYPE}")));
        assert_eq!(set.variables.get("TYPE"), Some(&json!({"default": "pool"})));
        assert_eq!(pool.get("default_server_port"), Some(&json!("${var.DEFAULT_SERVER_PORT}")));
        assert_eq!(set.variable_default("DEFAULT_SERVER_PORT"), Some(&json!(80)));
        assert_eq!(pool.get("tenant_ref"), Some(&json!("${var.TENANT_REF}")));
        assert_eq!(set.variable_default("TENANT_REF"), Some(&json!("/api/tenant/?name=admin")));
    }

    #[test]
    fn test_nested_fields_are_embedded_and_get_placeholder() {
        let set = TerraformResourceBuilder::default().build(&pool());
        let pool = block(&set, "avi_pool", "foo_pool");

        assert_eq!(
            pool.get("servers"),
            Some(&json!([{"ip": {"addr": "10.0.0.10", "type": "V4"}}]))
        );
        assert_eq!(set.variable_default("SERVERS"), Some(&json!([])));
        assert_eq!(
            pool.get("analytics_policy"),
            Some(&json!({"enable_realtime_metrics": false}))
        );
        assert_eq!(set.variable_default("ANALYTICS_POLICY"), Some(&json!({})));
    }

    #[test]
    fn test_credential_variables_are_seeded() {
        let set = TerraformResourceBuilder::default().build(&ObjectCollection::new());

        assert_eq!(set.variable_default(USERNAME_VARIABLE), Some(&json!("admin")));
        assert_eq!(set.variable_default(VERSION_VARIABLE), Some(&json!("21.1.3")));
        assert!(set.variables.contains_key(PASSWORD_VARIABLE));
        assert!(set.variables.contains_key(CONTROLLER_VARIABLE));
        assert!(set.resource.is_empty());
    }

    #[test]
    fn test_every_scalar_reference_has_matching_default() {
        let set = TerraformResourceBuilder::default().build(&pool());
        let original = pool().iter().next().unwrap().1.clone();

        for (field, value) in block(&set, "avi_pool", "foo_pool") {
            let Some(reference) = value.as_str().and_then(|s| s.strip_prefix("${var.")) else {
                continue;
            };
            let name = reference.trim_end_matches('}');
            assert_eq!(set.variable_default(name), original.get(field), "field {}", field);
        }
    }

    #[test]
    fn test_provider_block() {
        let set = TerraformResourceBuilder::new("avi", "vmware/avi", "22.1.4")
            .with_tenant("prod")
            .build(&pool());

        assert_eq!(
            set.provider_document(),
            json!({
                "terraform": {
                    "required_providers": {
                        "avi": {"source": "vmware/avi", "version": "22.1.4"}
                    }
                },
                "provider": {
                    "avi": {
                        "avi_username": "${var.avi_username}",
                        "avi_password": "${var.avi_password}",
                        "avi_controller": "${var.avi_controller}",
                        "avi_version": "${var.avi_version}",
                        "avi_tenant": "prod"
                    }
                }
            })
        );
    }

    #[test]
    fn test_version_default_can_differ_from_provider_pin() {
        let set = TerraformResourceBuilder::new("avi", "vmware/avi", "22.1.4")
            .with_version_default("22.1.3")
            .build(&ObjectCollection::new());
        assert_eq!(set.variable_default(VERSION_VARIABLE), Some(&json!("22.1.3")));
    }

    #[test]
    fn test_same_type_objects_are_keyed_by_name() {
        let mut objects = ObjectCollection::new();
        objects.push("pool", json!({"name": "web", "lb_algorithm": "LB_ALGORITHM_ROUND_ROBIN"}));
        objects.push("pool", json!({"name": "api", "lb_algorithm": "LB_ALGORITHM_LEAST_CONNECTIONS"}));

        let set = TerraformResourceBuilder::default().build(&objects);
        let web = block(&set, "avi_pool", "web");
        let api = block(&set, "avi_pool", "api");

        assert_eq!(web.get("lb_algorithm"), Some(&json!("${var.LB_ALGORITHM}")));
        assert_eq!(api.get("lb_algorithm"), Some(&json!("${var.API_LB_ALGORITHM}")));
        assert_eq!(
            set.variable_default("API_LB_ALGORITHM"),
            Some(&json!("LB_ALGORITHM_LEAST_CONNECTIONS"))
        );
        assert_eq!(web.get("name"), Some(&json!("${var.NAME}")));
        assert_eq!(api.get("name"), Some(&json!("${var.API_NAME}")));
    }

    #[test]
    fn test_identical_values_share_a_variable() {
        let mut objects = ObjectCollection::new();
        objects.push("pool", json!({"name": "web", "enabled": true}));
        objects.push("virtualservice", json!({"name": "vs", "enabled": true}));

        let set = TerraformResourceBuilder::default().build(&objects);
        assert_eq!(block(&set, "avi_virtualservice", "vs").get("enabled"), Some(&json!("${var.ENABLED}")));
        assert!(!set.variables.contains_key("VS_ENABLED"));
    }

    #[test]
    fn test_colliding_labels_keep_both_objects() {
        let mut objects = ObjectCollection::new();
        objects.push("pool", json!({"name": "a.b", "default_server_port": 80}));
        objects.push("pool", json!({"name": "a_b", "default_server_port": 8080}));
        objects.push("pool", json!({"name": "a.b", "default_server_port": 443}));

        let set = TerraformResourceBuilder::default().build(&objects);
        let pools = set.resource.get("avi_pool").and_then(Value::as_object).unwrap();
        let labels: Vec<&String> = pools.keys().collect();
        assert_eq!(labels, vec!["a_b", "a_b_2", "a_b_3"]);

        let port = block(&set, "avi_pool", "a_b_2").get("default_server_port").unwrap();
        let name = port.as_str().unwrap().trim_start_matches("${var.").trim_end_matches('}');
        assert_eq!(set.variable_default(name), Some(&json!(8080)));
    }

    #[test]
    fn test_resource_label_sanitization() {
        assert_eq!(resource_label("pool", &json!({"name": "foo_pool"}), 0), "foo_pool");
        assert_eq!(resource_label("pool", &json!({"name": "web.example.com"}), 0), "web_example_com");
        assert_eq!(resource_label("pool", &json!({"name": "1st-pool"}), 0), "_1st-pool");
        assert_eq!(resource_label("pool", &json!({}), 3), "pool_3");
    }

    #[test]
    fn test_documents_are_wrapped() {
        let set = TerraformResourceBuilder::default().build(&pool());
        assert!(set.variables_document().get("variable").is_some());
        assert!(
            set.resource_document()
                .pointer("/resource/avi_pool/foo_pool/name")
                .is_some()
        );
    }
}
