//! Ansible playbook rendering
//!
//! Every object becomes one task keyed by `<prefix>_<object type>`. Scalars are
//! rewritten into `{{ VAR | default(<original>) }}` expressions so any value can
//! be overridden from inventory or extra-vars without touching the playbook.
//! A leading probe task registers the controller version that every later
//! task passes as `api_version`.

use serde::Serialize;
use serde_json::{Map, Value};

use super::field::{FieldKind, variable_name};
use crate::objects::ObjectCollection;
use crate::sanitize::PortableReference;

/// Name the version probe result is registered under
pub const VERSION_REGISTER: &str = "avi_controller_version";

/// Authentication parameters merged into every task
pub const AUTH_FIELDS: [&str; 3] = ["controller", "username", "password"];

const PROBE_TASK_NAME: &str = "Obtain Avi Controller API version";
const SDK_ROLE: &str = "avinetworks.avisdk";

/// One rendered task
pub type Task = Map<String, Value>;

/// A single play targeting the local host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Play {
    pub hosts: String,
    pub connection: String,
    pub roles: Vec<String>,
    pub tasks: Vec<Task>,
}

pub struct AnsibleTaskBuilder {
    module_prefix: String,
}

impl AnsibleTaskBuilder {
    pub fn new(module_prefix: impl Into<String>) -> Self {
        Self {
            module_prefix: module_prefix.into(),
        }
    }

    /// Render the ordered task list: the version probe followed by one task per
    /// object in encounter order.
    pub fn build(&self, objects: &ObjectCollection) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(objects.len() + 1);
        tasks.push(self.version_probe_task());

        for (object_type, object) in objects.iter() {
            tasks.push(self.object_task(object_type, object));
        }

        tasks
    }

    /// Wrap the task list in a playbook with a single local play
    pub fn build_playbook(&self, objects: &ObjectCollection) -> Vec<Play> {
        vec![Play {
            hosts: "localhost".to_string(),
            connection: "local".to_string(),
            roles: vec![SDK_ROLE.to_string()],
            tasks: self.build(objects),
        }]
    }

    fn version_probe_task(&self) -> Task {
        let mut task = Task::new();
        task.insert("name".to_string(), Value::String(PROBE_TASK_NAME.to_string()));
        task.insert(
            format!("{}_api_version", self.module_prefix),
            Value::Object(auth_params()),
        );
        task.insert(
            "register".to_string(),
            Value::String(VERSION_REGISTER.to_string()),
        );
        task
    }

    fn object_task(&self, object_type: &str, object: &Value) -> Task {
        let mut params = match object {
            Value::Object(fields) => fields
                .iter()
                .map(|(name, value)| {
                    let path = vec![name.clone()];
                    (name.clone(), template_field(object_type, &path, name, value))
                })
                .collect(),
            // Non-mapping objects have no fields to template
            _ => Map::new(),
        };

        params.extend(auth_params());
        params.insert(
            "api_version".to_string(),
            Value::String(format!("{{{{ {}.obj.version }}}}", VERSION_REGISTER)),
        );

        let mut task = Task::new();
        task.insert(
            format!("{}_{}", self.module_prefix, object_type),
            Value::Object(params),
        );
        task
    }
}

impl Default for AnsibleTaskBuilder {
    fn default() -> Self {
        Self::new("avi")
    }
}

fn auth_params() -> Map<String, Value> {
    AUTH_FIELDS
        .iter()
        .map(|field| (field.to_string(), Value::String(format!("{{{{ {} }}}}", field))))
        .collect()
}

/// Template one field. `path` is the field path below the object and
/// `field_name` the nearest enclosing mapping key, which decides whether a
/// string is treated as a reference.
fn template_field(object_type: &str, path: &[String], field_name: &str, value: &Value) -> Value {
    match FieldKind::classify(field_name, value) {
        FieldKind::Nested(Value::Object(fields)) => Value::Object(
            fields
                .iter()
                .map(|(name, child)| {
                    let child_path = extend(path, name);
                    (
                        name.clone(),
                        template_field(object_type, &child_path, name, child),
                    )
                })
                .collect(),
        ),
        FieldKind::Nested(Value::Array(items)) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    let child_path = extend(path, &index.to_string());
                    template_field(object_type, &child_path, field_name, child)
                })
                .collect(),
        ),
        FieldKind::Nested(other) => other.clone(),
        FieldKind::Reference(reference) => {
            let parts: Vec<&str> = path.iter().map(String::as_str).collect();
            Value::String(reference_expression(&reference, &variable_name(&parts)))
        }
        FieldKind::Scalar(scalar) => {
            let mut parts: Vec<&str> = vec![object_type];
            parts.extend(path.iter().map(String::as_str));
            Value::String(scalar_expression(scalar, &variable_name(&parts)))
        }
    }
}

fn extend(path: &[String], segment: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(segment.to_string());
    child
}

/// `/api/<type>/?name={{ VAR | default("<anchor>") }}`
pub fn reference_expression(reference: &PortableReference, variable: &str) -> String {
    format!(
        "{}{{{{ {} | default({}) }}}}",
        reference.path_prefix(),
        variable,
        json_literal(&Value::String(reference.anchor.clone()))
    )
}

/// `{{ VAR | default(<json literal>) }}`, with JSON `null` spelled as Jinja `none`
pub fn scalar_expression(value: &Value, variable: &str) -> String {
    let literal = match value {
        Value::Null => "none".to_string(),
        other => json_literal(other),
    };
    format!("{{{{ {} | default({}) }}}}", variable, literal)
}

fn json_literal(value: &Value) -> String {
    // Serializing a scalar serde_json::Value cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}
