//! Field editor operations over a schema draft.
//!
//! A [`SchemaDraft`] is the single owner of the tree being edited. Every
//! operation goes through [`SchemaDraft::apply`], which returns a new draft
//! and leaves the receiver untouched, so each edit is a function
//! `(old draft, op) -> new draft`.

use crate::export::ExtractionContract;
use crate::field::{validate_fields, FieldError, FieldType, Properties, SchemaField};
use crate::path::{FieldPath, PathStep};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_DRAFT_DESCRIPTION: &str = "Extract the relevant fields for this document";

const PROPERTY_PREFIX: &str = "property";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("No field at path '{0}'")]
    PathNotFound(FieldPath),

    #[error("Field at '{0}' is not an object")]
    NotAnObject(FieldPath),

    #[error("The items descriptor at '{0}' cannot be removed, only retyped")]
    ItemsNotRemovable(FieldPath),

    #[error("Object at '{parent}' has no property '{name}'")]
    PropertyNotFound { parent: FieldPath, name: String },

    #[error("Property name cannot be empty (at '{0}')")]
    EmptyPropertyName(FieldPath),

    #[error("Property name '{name}' at '{parent}' cannot contain '.' or be '[]'")]
    UnaddressableName { parent: FieldPath, name: String },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Partial update merged into a field. Absent members are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Blank clears the description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn field_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.field_type.is_none() && self.description.is_none()
    }
}

/// One editor operation. The JSON form is tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// Append a new string field to the top level, or a new property to the
    /// object at `parent`.
    AddField {
        #[serde(default)]
        parent: Option<FieldPath>,
    },
    UpdateField {
        path: FieldPath,
        patch: FieldPatch,
    },
    /// Delete a top-level field or an object property.
    RemoveField { path: FieldPath },
    AddProperty { parent: FieldPath },
    RemoveProperty { parent: FieldPath, name: String },
    SetDescription { description: String },
    ReplaceFields { fields: Vec<SchemaField> },
    AppendFields { fields: Vec<SchemaField> },
}

/// The editable schema: description plus top-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDraft {
    description: String,
    fields: Vec<SchemaField>,
}

impl Default for SchemaDraft {
    fn default() -> Self {
        Self {
            description: DEFAULT_DRAFT_DESCRIPTION.to_string(),
            fields: Vec::new(),
        }
    }
}

impl SchemaDraft {
    pub fn new(description: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            description: description.into(),
            fields,
        }
    }

    pub fn from_fields(fields: Vec<SchemaField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<SchemaField> {
        self.fields
    }

    pub fn field(&self, path: &FieldPath) -> Option<&SchemaField> {
        path.resolve(&self.fields)
    }

    /// Apply `op` to a copy of this draft.
    pub fn apply(&self, op: &EditOp) -> Result<SchemaDraft, EditError> {
        let mut next = self.clone();
        next.apply_in_place(op)?;
        debug!(?op, fields = next.fields.len(), "applied edit");
        Ok(next)
    }

    /// Apply several operations in order. Stops at the first error.
    pub fn apply_all<'a>(
        &self,
        ops: impl IntoIterator<Item = &'a EditOp>,
    ) -> Result<SchemaDraft, EditError> {
        let mut next = self.clone();
        for op in ops {
            next.apply_in_place(op)?;
        }
        Ok(next)
    }

    pub fn add_field(&self, parent: Option<FieldPath>) -> Result<SchemaDraft, EditError> {
        self.apply(&EditOp::AddField { parent })
    }

    pub fn update_field(&self, path: FieldPath, patch: FieldPatch) -> Result<SchemaDraft, EditError> {
        self.apply(&EditOp::UpdateField { path, patch })
    }

    pub fn remove_field(&self, path: FieldPath) -> Result<SchemaDraft, EditError> {
        self.apply(&EditOp::RemoveField { path })
    }

    pub fn add_property(&self, parent: FieldPath) -> Result<SchemaDraft, EditError> {
        self.apply(&EditOp::AddProperty { parent })
    }

    pub fn remove_property(
        &self,
        parent: FieldPath,
        name: impl Into<String>,
    ) -> Result<SchemaDraft, EditError> {
        self.apply(&EditOp::RemoveProperty {
            parent,
            name: name.into(),
        })
    }

    /// The contract for the current tree.
    pub fn contract(&self) -> ExtractionContract {
        ExtractionContract::new(self.description.clone(), &self.fields)
    }

    /// Check the tree is ready to save or export. Drafts may hold unnamed or
    /// duplicate top-level fields while being edited; this rejects them.
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_fields(&self.fields)
    }

    fn apply_in_place(&mut self, op: &EditOp) -> Result<(), EditError> {
        match op {
            EditOp::AddField { parent: None } => {
                self.fields.push(SchemaField::string(""));
                Ok(())
            }
            EditOp::AddField {
                parent: Some(parent),
            }
            | EditOp::AddProperty { parent } => {
                let properties = self.object_at(parent)?;
                let name = next_property_name(properties);
                properties.insert(name.clone(), SchemaField::string(name));
                Ok(())
            }
            EditOp::UpdateField { path, patch } => self.update_in_place(path, patch),
            EditOp::RemoveField { path } => self.remove_in_place(path),
            EditOp::RemoveProperty { parent, name } => {
                let properties = self.object_at(parent)?;
                match properties.shift_remove(name) {
                    Some(_) => Ok(()),
                    None => Err(EditError::PropertyNotFound {
                        parent: parent.clone(),
                        name: name.clone(),
                    }),
                }
            }
            EditOp::SetDescription { description } => {
                self.description = description.clone();
                Ok(())
            }
            EditOp::ReplaceFields { fields } => {
                self.fields = fields.clone();
                Ok(())
            }
            EditOp::AppendFields { fields } => {
                self.fields.extend(fields.iter().cloned());
                Ok(())
            }
        }
    }

    fn object_at(&mut self, path: &FieldPath) -> Result<&mut Properties, EditError> {
        let field = path
            .resolve_mut(&mut self.fields)
            .ok_or_else(|| EditError::PathNotFound(path.clone()))?;
        field
            .properties_mut()
            .ok_or_else(|| EditError::NotAnObject(path.clone()))
    }

    fn update_in_place(&mut self, path: &FieldPath, patch: &FieldPatch) -> Result<(), EditError> {
        if path.resolve(&self.fields).is_none() {
            return Err(EditError::PathNotFound(path.clone()));
        }

        if let Some(new_name) = &patch.name {
            self.rename(path, new_name)?;
        }

        // Renaming a property changes the path's last step
        let path = match (&patch.name, path.last_step()) {
            (Some(new_name), Some(PathStep::Property(_))) => {
                path.with_last(PathStep::Property(new_name.clone()))
            }
            _ => path.clone(),
        };
        let field = path
            .resolve_mut(&mut self.fields)
            .ok_or_else(|| EditError::PathNotFound(path.clone()))?;

        if let Some(field_type) = patch.field_type {
            field.set_type(field_type);
        }
        if let Some(description) = &patch.description {
            field.set_description(description.as_str());
        }
        Ok(())
    }

    fn rename(&mut self, path: &FieldPath, new_name: &str) -> Result<(), EditError> {
        let old_name = match path.last_step() {
            // Top-level fields and items descriptors are not keyed
            None | Some(PathStep::Items) => {
                if let Some(field) = path.resolve_mut(&mut self.fields) {
                    field.name = new_name.to_string();
                }
                return Ok(());
            }
            Some(PathStep::Property(old_name)) => old_name,
        };
        if old_name == new_name {
            return Ok(());
        }
        let parent = path
            .parent()
            .ok_or_else(|| EditError::PathNotFound(path.clone()))?;
        if new_name.is_empty() {
            return Err(EditError::EmptyPropertyName(parent));
        }
        if !FieldPath::is_addressable_name(new_name) {
            return Err(EditError::UnaddressableName {
                parent,
                name: new_name.to_string(),
            });
        }

        let properties = self.object_at(&parent)?;
        if properties.contains_key(new_name) {
            return Err(FieldError::DuplicateName {
                parent: parent.to_string(),
                name: new_name.to_string(),
            }
            .into());
        }
        let index = properties
            .get_index_of(old_name)
            .ok_or_else(|| EditError::PathNotFound(path.clone()))?;
        if let Some((_, mut field)) = properties.shift_remove_index(index) {
            field.name = new_name.to_string();
            properties.shift_insert(index, new_name.to_string(), field);
        }
        Ok(())
    }

    fn remove_in_place(&mut self, path: &FieldPath) -> Result<(), EditError> {
        match path.last_step() {
            None => {
                if path.index() >= self.fields.len() {
                    return Err(EditError::PathNotFound(path.clone()));
                }
                self.fields.remove(path.index());
                Ok(())
            }
            Some(PathStep::Items) => Err(EditError::ItemsNotRemovable(path.clone())),
            Some(PathStep::Property(name)) => {
                let parent = path
                    .parent()
                    .ok_or_else(|| EditError::PathNotFound(path.clone()))?;
                let properties = self.object_at(&parent)?;
                match properties.shift_remove(name) {
                    Some(_) => Ok(()),
                    None => Err(EditError::PathNotFound(path.clone())),
                }
            }
        }
    }
}

/// `property{N}`, N starting after the current count and skipping taken names.
fn next_property_name(properties: &Properties) -> String {
    let mut n = properties.len() + 1;
    loop {
        let candidate = format!("{}{}", PROPERTY_PREFIX, n);
        if !properties.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
