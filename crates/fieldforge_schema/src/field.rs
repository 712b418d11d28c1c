//! Schema Field Tree
//!
//! The in-memory extraction schema: scalar fields, arrays with exactly one
//! items descriptor, and objects with named properties. Each variant carries
//! only the children that are valid for it, so a field can never hold both
//! `items` and `properties`.
//!
//! The JSON shape (`{name, type, description?, items?, properties?}`) is the
//! one saved in templates. Deserialization validates that shape.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name given to an array's items descriptor when none was supplied.
pub const DEFAULT_ITEMS_NAME: &str = "items";

/// Properties of an object field, keyed by the child's name, in insertion order.
pub type Properties = IndexMap<String, SchemaField>;

/// Errors raised when a field tree (or its JSON form) is not well formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Unknown field type: '{0}' (expected string, number, boolean, array or object)")]
    UnknownType(String),

    #[error("Field under '{parent}' has an empty name")]
    EmptyName { parent: String },

    #[error("Duplicate field name '{name}' under '{parent}'")]
    DuplicateName { parent: String, name: String },

    #[error("Property key '{key}' does not match field name '{name}'")]
    KeyMismatch { key: String, name: String },

    #[error("Field '{name}' of type {field_type} cannot have items")]
    UnexpectedItems { name: String, field_type: FieldType },

    #[error("Field '{name}' of type {field_type} cannot have properties")]
    UnexpectedProperties { name: String, field_type: FieldType },
}

/// The five supported field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Array,
        FieldType::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Array and object fields hold children; the rest are scalars.
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Array | FieldType::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FieldError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| FieldError::UnknownType(s.trim().to_string()))
    }
}

/// Type-specific payload of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array { items: Box<SchemaField> },
    Object { properties: Properties },
}

impl FieldKind {
    /// A fresh payload for `field_type`: empty properties for objects,
    /// the default string descriptor for arrays.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => FieldKind::String,
            FieldType::Number => FieldKind::Number,
            FieldType::Boolean => FieldKind::Boolean,
            FieldType::Array => FieldKind::Array {
                items: Box::new(SchemaField::default_items()),
            },
            FieldType::Object => FieldKind::Object {
                properties: Properties::new(),
            },
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::String => FieldType::String,
            FieldKind::Number => FieldType::Number,
            FieldKind::Boolean => FieldType::Boolean,
            FieldKind::Array { .. } => FieldType::Array,
            FieldKind::Object { .. } => FieldType::Object,
        }
    }
}

/// A node in the extraction schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Identifier, unique among siblings
    pub name: String,

    /// Variant payload (children live here)
    pub kind: FieldKind,

    /// Human-readable purpose; `None` rather than an empty string
    description: Option<String>,
}

impl SchemaField {
    /// Create a field of the given type with empty children.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::from_kind(name, FieldKind::empty(field_type))
    }

    pub fn from_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// An array whose elements are described by `items`.
    pub fn array(name: impl Into<String>, items: SchemaField) -> Self {
        Self::from_kind(
            name,
            FieldKind::Array {
                items: Box::new(items),
            },
        )
    }

    /// An object with the given properties. A later property with the same
    /// name replaces the earlier one.
    pub fn object(name: impl Into<String>, properties: impl IntoIterator<Item = SchemaField>) -> Self {
        let properties = properties
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect();
        Self::from_kind(name, FieldKind::Object { properties })
    }

    /// The descriptor a newly created array starts with.
    pub fn default_items() -> Self {
        Self::string(DEFAULT_ITEMS_NAME)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(description);
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the description. Blank input clears it.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
    }

    pub fn clear_description(&mut self) {
        self.description = None;
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Change the type. Children survive only when the type is unchanged;
    /// otherwise the payload is reset to the new type's empty form.
    pub fn set_type(&mut self, field_type: FieldType) {
        if self.field_type() != field_type {
            self.kind = FieldKind::empty(field_type);
        }
    }

    pub fn items(&self) -> Option<&SchemaField> {
        match &self.kind {
            FieldKind::Array { items } => Some(items),
            _ => None,
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut SchemaField> {
        match &mut self.kind {
            FieldKind::Array { items } => Some(items.as_mut()),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&Properties> {
        match &self.kind {
            FieldKind::Object { properties } => Some(properties),
            _ => None,
        }
    }

    pub fn properties_mut(&mut self) -> Option<&mut Properties> {
        match &mut self.kind {
            FieldKind::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Object properties, retyping the field to an empty object first if it
    /// is anything else.
    pub(crate) fn object_properties_mut(&mut self) -> &mut Properties {
        if self.field_type() != FieldType::Object {
            self.set_type(FieldType::Object);
        }
        match &mut self.kind {
            FieldKind::Object { properties } => properties,
            _ => unreachable!("field was retyped to object"),
        }
    }

    /// Array items, retyping the field to an array with the default
    /// descriptor first if it is anything else.
    pub(crate) fn array_items_mut(&mut self) -> &mut SchemaField {
        if self.field_type() != FieldType::Array {
            self.set_type(FieldType::Array);
        }
        match &mut self.kind {
            FieldKind::Array { items } => items.as_mut(),
            _ => unreachable!("field was retyped to array"),
        }
    }

    /// Check names throughout the subtree: non-empty, property keys equal
    /// to their field's name.
    pub fn validate(&self) -> Result<(), FieldError> {
        self.validate_under(ROOT_LABEL)
    }

    fn validate_under(&self, parent: &str) -> Result<(), FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::EmptyName {
                parent: parent.to_string(),
            });
        }
        let here = if parent == ROOT_LABEL {
            self.name.clone()
        } else {
            format!("{}.{}", parent, self.name)
        };
        match &self.kind {
            FieldKind::Array { items } => items.validate_under(&format!("{}[]", here)),
            FieldKind::Object { properties } => {
                for (key, child) in properties {
                    if key != &child.name {
                        return Err(FieldError::KeyMismatch {
                            key: key.clone(),
                            name: child.name.clone(),
                        });
                    }
                    child.validate_under(&here)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

const ROOT_LABEL: &str = "<root>";

/// Validate a top-level field list: every field valid, no two sharing a name.
pub fn validate_fields(fields: &[SchemaField]) -> Result<(), FieldError> {
    let mut seen = HashSet::new();
    for field in fields {
        field.validate()?;
        if !seen.insert(field.name.as_str()) {
            return Err(FieldError::DuplicateName {
                parent: ROOT_LABEL.to_string(),
                name: field.name.clone(),
            });
        }
    }
    Ok(())
}

/// One line of a flattened view of the tree, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineRow {
    /// Dotted path; array items appear as `name[]`
    pub path: String,
    pub depth: usize,
    pub field_type: FieldType,
    pub description: Option<String>,
}

/// Depth-first listing of every node under `fields`.
pub fn outline(fields: &[SchemaField]) -> Vec<OutlineRow> {
    fn walk(field: &SchemaField, path: String, depth: usize, out: &mut Vec<OutlineRow>) {
        out.push(OutlineRow {
            path: path.clone(),
            depth,
            field_type: field.field_type(),
            description: field.description.clone(),
        });
        match &field.kind {
            FieldKind::Array { items } => match &items.kind {
                // Object items are unnamed in the contract; list their members directly
                FieldKind::Object { properties } => {
                    for child in properties.values() {
                        walk(child, format!("{}[].{}", path, child.name), depth + 1, out);
                    }
                }
                _ => walk(items, format!("{}[]", path), depth + 1, out),
            },
            FieldKind::Object { properties } => {
                for child in properties.values() {
                    walk(child, format!("{}.{}", path, child.name), depth + 1, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for field in fields {
        walk(field, field.name.clone(), 0, &mut out);
    }
    out
}

impl Serialize for SchemaField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.field_type())?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        match &self.kind {
            FieldKind::Array { items } => map.serialize_entry("items", items)?,
            FieldKind::Object { properties } => map.serialize_entry("properties", properties)?,
            _ => {}
        }
        map.end()
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFieldRepr {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    items: Option<Box<SchemaFieldRepr>>,
    #[serde(default)]
    properties: Option<IndexMap<String, SchemaFieldRepr>>,
}

impl SchemaFieldRepr {
    fn into_field(self, fallback_name: &str) -> Result<SchemaField, FieldError> {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => fallback_name.to_string(),
        };
        let field_type: FieldType = self.field_type.parse()?;

        if self.items.is_some() && field_type != FieldType::Array {
            return Err(FieldError::UnexpectedItems { name, field_type });
        }
        if self.properties.is_some() && field_type != FieldType::Object {
            return Err(FieldError::UnexpectedProperties { name, field_type });
        }

        let kind = match field_type {
            FieldType::Array => match self.items {
                Some(items) => FieldKind::Array {
                    items: Box::new(items.into_field(DEFAULT_ITEMS_NAME)?),
                },
                None => FieldKind::empty(FieldType::Array),
            },
            FieldType::Object => {
                let mut properties = Properties::new();
                for (key, repr) in self.properties.unwrap_or_default() {
                    // The field's own name wins over a stale map key
                    let child = repr.into_field(&key)?;
                    if properties.contains_key(&child.name) {
                        return Err(FieldError::DuplicateName {
                            parent: name,
                            name: child.name,
                        });
                    }
                    properties.insert(child.name.clone(), child);
                }
                FieldKind::Object { properties }
            }
            other => FieldKind::empty(other),
        };

        let mut field = SchemaField::from_kind(name, kind);
        if let Some(description) = self.description {
            field.set_description(description);
        }
        Ok(field)
    }
}

impl<'de> Deserialize<'de> for SchemaField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = SchemaFieldRepr::deserialize(deserializer)?;
        repr.into_field("").map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_parse() {
        assert_eq!("string".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("  Number ".parse::<FieldType>().unwrap(), FieldType::Number);
        assert_eq!("OBJECT".parse::<FieldType>().unwrap(), FieldType::Object);
        assert!(matches!(
            "integer".parse::<FieldType>(),
            Err(FieldError::UnknownType(t)) if t == "integer"
        ));
    }

    #[test]
    fn test_new_initializes_children() {
        let array = SchemaField::new("tags", FieldType::Array);
        assert_eq!(array.items().unwrap().name, DEFAULT_ITEMS_NAME);
        assert_eq!(array.items().unwrap().field_type(), FieldType::String);
        assert!(array.properties().is_none());

        let object = SchemaField::new("order", FieldType::Object);
        assert!(object.properties().unwrap().is_empty());
        assert!(object.items().is_none());

        let scalar = SchemaField::boolean("paid");
        assert!(scalar.items().is_none());
        assert!(scalar.properties().is_none());
    }

    #[test]
    fn test_set_type_resets_children() {
        let mut field = SchemaField::object("order", vec![SchemaField::number("total")]);
        field.set_type(FieldType::Object);
        assert_eq!(field.properties().unwrap().len(), 1);

        field.set_type(FieldType::Array);
        assert!(field.properties().is_none());
        assert_eq!(field.items().unwrap(), &SchemaField::default_items());

        field.set_type(FieldType::String);
        assert!(field.items().is_none());
    }

    #[test]
    fn test_blank_description_is_none() {
        let field = SchemaField::string("x").with_description("   ");
        assert_eq!(field.description(), None);

        let field = SchemaField::string("x").with_description("The x");
        assert_eq!(field.description(), Some("The x"));
    }

    #[test]
    fn test_serialize_shape() {
        let field = SchemaField::array(
            "items",
            SchemaField::object("item", vec![SchemaField::string("sku").with_description("SKU")]),
        );
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "items",
                "type": "array",
                "items": {
                    "name": "item",
                    "type": "object",
                    "properties": {
                        "sku": {"name": "sku", "type": "string", "description": "SKU"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let field: SchemaField = serde_json::from_value(json!({
            "name": "doc",
            "type": "object",
            "properties": {
                "tags": {"type": "array"},
                "meta": {"name": "meta", "type": "object"}
            }
        }))
        .unwrap();

        let props = field.properties().unwrap();
        assert_eq!(props["tags"].name, "tags");
        assert_eq!(props["tags"].items().unwrap(), &SchemaField::default_items());
        assert!(props["meta"].properties().unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_rekeys_by_name() {
        let field: SchemaField = serde_json::from_value(json!({
            "name": "doc",
            "type": "object",
            "properties": {
                "property1": {"name": "title", "type": "string"}
            }
        }))
        .unwrap();

        let props = field.properties().unwrap();
        assert!(props.contains_key("title"));
        assert!(!props.contains_key("property1"));
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_deserialize_rejects_invalid_children() {
        let err = serde_json::from_value::<SchemaField>(json!({
            "name": "x", "type": "string", "items": {"type": "string"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cannot have items"));

        let err = serde_json::from_value::<SchemaField>(json!({
            "name": "x", "type": "array", "properties": {}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cannot have properties"));

        let err = serde_json::from_value::<SchemaField>(json!({
            "name": "x", "type": "date"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Unknown field type"));
    }

    #[test]
    fn test_validate_fields() {
        let fields = vec![SchemaField::string("a"), SchemaField::number("b")];
        assert!(validate_fields(&fields).is_ok());

        let fields = vec![SchemaField::string("a"), SchemaField::number("a")];
        assert!(matches!(
            validate_fields(&fields),
            Err(FieldError::DuplicateName { name, .. }) if name == "a"
        ));

        let fields = vec![SchemaField::object("order", vec![SchemaField::string("")])];
        assert!(matches!(
            validate_fields(&fields),
            Err(FieldError::EmptyName { parent }) if parent == "order"
        ));
    }

    #[test]
    fn test_validate_detects_key_mismatch() {
        let mut field = SchemaField::new("order", FieldType::Object);
        field
            .properties_mut()
            .unwrap()
            .insert("total".to_string(), SchemaField::number("sum"));
        assert!(matches!(field.validate(), Err(FieldError::KeyMismatch { .. })));
    }

    #[test]
    fn test_outline() {
        let fields = vec![
            SchemaField::object("order", vec![SchemaField::number("total")]),
            SchemaField::array(
                "items",
                SchemaField::object("item", vec![SchemaField::string("sku")]),
            ),
            SchemaField::array("tags", SchemaField::default_items()),
        ];
        let paths: Vec<String> = outline(&fields).into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec!["order", "order.total", "items", "items[].sku", "tags", "tags[]"]
        );
    }
}
