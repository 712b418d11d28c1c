//! Checking extracted records against an exported contract.
//!
//! Violations are data, not errors: a check always runs to completion and
//! reports everything it found.

use crate::export::{ExtractionContract, FieldSpec, INSTANCES_KEY};
use crate::field::{FieldType, SchemaField};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceViolationKind {
    TypeMismatch,
    MissingRequired,
}

impl fmt::Display for InstanceViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceViolationKind::TypeMismatch => write!(f, "type_mismatch"),
            InstanceViolationKind::MissingRequired => write!(f, "missing_required"),
        }
    }
}

/// One problem found in an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceViolation {
    /// Location in the payload, e.g. `instances[0].order.total`
    pub path: String,
    pub kind: InstanceViolationKind,
    pub expected: String,
    pub got: String,
}

impl InstanceViolation {
    fn type_mismatch(path: &str, expected: FieldType, value: &Value) -> Self {
        Self {
            path: path.to_string(),
            kind: InstanceViolationKind::TypeMismatch,
            expected: expected.to_string(),
            got: json_type_name(value).to_string(),
        }
    }

    fn missing(path: &str, expected: FieldType) -> Self {
        Self {
            path: path.to_string(),
            kind: InstanceViolationKind::MissingRequired,
            expected: expected.to_string(),
            got: "nothing".to_string(),
        }
    }
}

impl fmt::Display for InstanceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        match self.kind {
            InstanceViolationKind::TypeMismatch => write!(
                f,
                "{}: expected {}, got {}",
                path, self.expected, self.got
            ),
            InstanceViolationKind::MissingRequired => {
                write!(f, "{}: required {} is missing", path, self.expected)
            }
        }
    }
}

/// Outcome of checking a tool call payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Number of instances in the payload (0 when `instances` is absent)
    pub instances: usize,
    pub violations: Vec<InstanceViolation>,
}

impl ExtractionReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check `value` against `spec`, collecting violations below `path`.
///
/// Object properties absent from the value are only reported when the spec
/// lists them as required. Keys the spec does not know are ignored. A spec
/// without `items`/`properties` accepts any elements/members.
pub fn validate_instance(spec: &FieldSpec, value: &Value, path: &str) -> Vec<InstanceViolation> {
    let mut violations = Vec::new();
    check(spec, value, path, &mut violations);
    violations
}

fn check(spec: &FieldSpec, value: &Value, path: &str, out: &mut Vec<InstanceViolation>) {
    match (spec.field_type, value) {
        (FieldType::String, Value::String(_))
        | (FieldType::Number, Value::Number(_))
        | (FieldType::Boolean, Value::Bool(_)) => {}
        (FieldType::Array, Value::Array(elements)) => {
            if let Some(items) = &spec.items {
                for (index, element) in elements.iter().enumerate() {
                    check(items, element, &format!("{}[{}]", path, index), out);
                }
            }
        }
        (FieldType::Object, Value::Object(members)) => {
            for name in &spec.required {
                if !members.contains_key(name) {
                    let expected = spec
                        .properties
                        .as_ref()
                        .and_then(|p| p.get(name))
                        .map(|s| s.field_type)
                        .unwrap_or_default();
                    out.push(InstanceViolation::missing(&join(path, name), expected));
                }
            }
            if let Some(properties) = &spec.properties {
                for (name, child) in properties {
                    if let Some(member) = members.get(name) {
                        check(child, member, &join(path, name), out);
                    }
                }
            }
        }
        (expected, other) => out.push(InstanceViolation::type_mismatch(path, expected, other)),
    }
}

/// Check a `{instances: [...]}` payload produced for `fields`. Every instance
/// must be an object carrying all top-level fields.
pub fn validate_extraction(fields: &[SchemaField], payload: &Value) -> ExtractionReport {
    let contract = ExtractionContract::new("", fields);
    let instances = payload
        .get(INSTANCES_KEY)
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    ExtractionReport {
        instances,
        violations: validate_instance(&contract.parameters(), payload, ""),
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
