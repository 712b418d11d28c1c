//! Templates: named, reusable field lists saved as JSON files.

use crate::editor::SchemaDraft;
use crate::field::{validate_fields, FieldError, SchemaField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template name cannot be empty")]
    EmptyName,

    #[error("Invalid field: {0}")]
    Field(#[from] FieldError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSchema {
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

/// A saved schema with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schema: TemplateSchema,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<SchemaField>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            schema: TemplateSchema { fields },
            created_at: Utc::now(),
            last_updated_at: None,
        }
    }

    /// Build a template from an edited draft, taking its description.
    pub fn from_draft(name: impl Into<String>, draft: &SchemaDraft) -> Self {
        Self::new(name, draft.description(), draft.fields().to_vec())
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.schema.fields
    }

    /// Open this template's fields for editing.
    pub fn to_draft(&self) -> SchemaDraft {
        SchemaDraft::new(self.description.clone(), self.schema.fields.clone())
    }

    /// Replace the fields with an edited draft and bump the update time.
    pub fn update_from_draft(&mut self, draft: &SchemaDraft) {
        self.description = draft.description().to_string();
        self.schema.fields = draft.fields().to_vec();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_updated_at = Some(Utc::now());
    }

    /// Non-empty name, named fields throughout, unique top-level names.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        validate_fields(&self.schema.fields)?;
        Ok(())
    }

    /// Load and validate a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path)?;
        let template: Template = serde_json::from_str(&content)?;
        template.validate()?;
        debug!(path = %path.display(), id = %template.id, "loaded template");
        Ok(template)
    }

    /// Validate, then write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), TemplateError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!(path = %path.display(), name = %self.name, "saved template");
        Ok(())
    }
}

/// Any of the JSON documents that carry a field list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldDocument {
    Template(Box<Template>),
    Schema { fields: Vec<SchemaField> },
    Fields(Vec<SchemaField>),
}

/// Read a field list from a template, a `{fields: [...]}` document, or a bare
/// array of fields. The fields are validated.
pub fn load_fields(path: &Path) -> Result<Vec<SchemaField>, TemplateError> {
    let content = fs::read_to_string(path)?;
    parse_fields(&content)
}

pub fn parse_fields(content: &str) -> Result<Vec<SchemaField>, TemplateError> {
    let fields = match serde_json::from_str::<FieldDocument>(content) {
        Ok(FieldDocument::Template(template)) => template.schema.fields,
        Ok(FieldDocument::Schema { fields }) | Ok(FieldDocument::Fields(fields)) => fields,
        // Untagged errors say nothing useful; retry as a bare list for the real cause
        Err(_) => serde_json::from_str::<Vec<SchemaField>>(content)?,
    };
    validate_fields(&fields)?;
    Ok(fields)
}
