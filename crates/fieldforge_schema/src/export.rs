//! Contract export: field tree -> JSON-Schema-shaped specs
//!
//! The exported form drops field names (they become map keys) and unwraps
//! array items to a single unnamed spec. The output is a pure function of
//! the tree: the same tree always yields the same keys in the same order.

use crate::field::{FieldKind, FieldType, SchemaField};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tool name used when none is configured.
pub const DEFAULT_TOOL_NAME: &str = "extraction_tool";

/// Field name of the record list in a tool call payload.
pub const INSTANCES_KEY: &str = "instances";

const INSTANCES_DESCRIPTION: &str = "Array of objects to be generated";

/// Exported properties of an object spec, keyed by field name.
pub type ContractProperties = IndexMap<String, FieldSpec>;

/// One exported contract node.
///
/// `items` and `properties` are optional: consumers treat a missing one as
/// "accept any shape".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,

    /// Only set on the tool envelope; plain exports never mark fields required
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ContractProperties>,
}

impl FieldSpec {
    /// A spec with only a type.
    pub fn of_type(field_type: FieldType) -> Self {
        Self {
            field_type,
            description: None,
            items: None,
            required: Vec::new(),
            properties: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    pub fn with_items(mut self, items: FieldSpec) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_properties(mut self, properties: ContractProperties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = required;
        self
    }
}

/// Export one field as an unnamed spec.
pub fn export_field(field: &SchemaField) -> FieldSpec {
    let mut spec = FieldSpec::of_type(field.field_type());
    if let Some(description) = field.description() {
        spec = spec.with_description(description);
    }
    match &field.kind {
        FieldKind::Array { items } => spec.with_items(export_field(items)),
        FieldKind::Object { properties } => {
            spec.with_properties(format_schema(properties.values()))
        }
        _ => spec,
    }
}

/// Export a field list as a map keyed by field name, in input order.
///
/// A repeated name keeps its first position and takes the later spec.
pub fn format_schema<'a>(fields: impl IntoIterator<Item = &'a SchemaField>) -> ContractProperties {
    fields
        .into_iter()
        .map(|field| (field.name.clone(), export_field(field)))
        .collect()
}

/// Root contract handed to the tool-calling layer:
/// `{type: "object", description, properties}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionContract {
    #[serde(rename = "type")]
    root_type: FieldType,
    pub description: String,
    pub properties: ContractProperties,
}

impl ExtractionContract {
    pub fn new(description: impl Into<String>, fields: &[SchemaField]) -> Self {
        Self {
            root_type: FieldType::Object,
            description: description.into(),
            properties: format_schema(fields),
        }
    }

    /// Names every instance must carry.
    pub fn required(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    /// The spec describing one extracted instance.
    pub fn instance_spec(&self) -> FieldSpec {
        FieldSpec::of_type(FieldType::Object)
            .with_required(self.required())
            .with_properties(self.properties.clone())
    }

    /// The contract as a generic spec (no `required`).
    pub fn as_field_spec(&self) -> FieldSpec {
        FieldSpec::of_type(FieldType::Object)
            .with_description(self.description.clone())
            .with_properties(self.properties.clone())
    }

    /// Spec of a tool call payload: `{instances: [instance, ...]}`.
    pub fn parameters(&self) -> FieldSpec {
        let instances = FieldSpec::of_type(FieldType::Array)
            .with_description(INSTANCES_DESCRIPTION)
            .with_items(self.instance_spec());

        let mut properties = ContractProperties::new();
        properties.insert(INSTANCES_KEY.to_string(), instances);
        FieldSpec::of_type(FieldType::Object)
            .with_required(vec![INSTANCES_KEY.to_string()])
            .with_properties(properties)
    }
}

/// Strict tool-calling definition wrapping an extraction contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub strict: bool,
    pub parameters: FieldSpec,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Build the tool definition for `fields`.
pub fn tool_definition(
    name: impl Into<String>,
    description: impl Into<String>,
    fields: &[SchemaField],
) -> ToolDefinition {
    let contract = ExtractionContract::new(description, fields);
    ToolDefinition {
        name: name.into(),
        parameters: contract.parameters(),
        description: contract.description,
        strict: true,
        additional_properties: false,
    }
}
