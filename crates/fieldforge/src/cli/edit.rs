//! Edit command - apply field editor operations to a saved template

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use fieldforge_schema::{
    outline, EditError, EditOp, FieldPatch, FieldPath, FieldType, SchemaDraft,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_outline};
use crate::cli::template::load_template;

/// Arguments for the `edit` command
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Template file to edit in place
    pub file: PathBuf,

    /// Show the result without saving
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output the edited template as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub action: EditAction,
}

#[derive(Debug, Subcommand)]
pub enum EditAction {
    /// Append a new field (top level, or a property of --parent)
    AddField {
        /// Name of the new field
        name: String,

        /// Object field to add the property to
        #[arg(long)]
        parent: Option<String>,

        #[arg(long = "type", default_value = "string")]
        field_type: FieldType,

        #[arg(long)]
        description: Option<String>,
    },
    /// Change a field's name, type or description
    Update {
        /// Field path, e.g. 0, 1.address, 2.[].sku
        path: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        field_type: Option<FieldType>,

        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a top-level field or an object property
    Remove { path: String },
    /// Add an auto-named property to an object field
    AddProperty { parent: String },
    /// Remove a named property from an object field
    RemoveProperty { parent: String, name: String },
    /// Set the template description
    SetDescription { description: String },
    /// Apply operations from a JSON file (one op or an array of ops)
    Apply { ops: PathBuf },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OpsDocument {
    Many(Vec<EditOp>),
    One(EditOp),
}

fn parse_path(text: &str) -> Result<FieldPath> {
    text.parse::<FieldPath>()
        .map_err(|e| HelpfulError::invalid_field_path(text, &e.to_string()).into())
}

fn read_ops(path: &Path) -> Result<Vec<EditOp>> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<OpsDocument>(&content) {
        Ok(OpsDocument::Many(ops)) => Ok(ops),
        Ok(OpsDocument::One(op)) => Ok(vec![op]),
        Err(e) => Err(HelpfulError::json_parse_error(path, &e.to_string())
            .with_suggestion(r#"TRY: {"op": "update_field", "path": "0", "patch": {"type": "number"}}"#)
            .into()),
    }
}

/// Add a field, then name and type it. The editor appends new fields with
/// a placeholder name, so the new node is the last one under its parent.
fn add_named_field(
    draft: &SchemaDraft,
    parent: Option<FieldPath>,
    patch: FieldPatch,
) -> Result<SchemaDraft, EditError> {
    let added = draft.add_field(parent.clone())?;
    let path = match parent {
        None => FieldPath::root(added.fields().len() - 1),
        Some(parent) => {
            let key = added
                .field(&parent)
                .and_then(|field| field.properties())
                .and_then(|properties| properties.keys().last())
                .cloned()
                .ok_or_else(|| EditError::NotAnObject(parent.clone()))?;
            parent.property(key)
        }
    };
    added.update_field(path, patch)
}

/// Apply one command-line action, returning the edited draft and the number
/// of operations it took.
fn apply_action(draft: &SchemaDraft, action: EditAction) -> Result<(SchemaDraft, usize)> {
    let op = match action {
        EditAction::AddField {
            name,
            parent,
            field_type,
            description,
        } => {
            let parent = parent.as_deref().map(parse_path).transpose()?;
            let patch = FieldPatch {
                name: Some(name),
                field_type: Some(field_type),
                description,
            };
            let edited = add_named_field(draft, parent, patch).map_err(edit_error)?;
            return Ok((edited, 1));
        }
        EditAction::Apply { ops } => {
            let ops = read_ops(&ops)?;
            let edited = draft.apply_all(&ops).map_err(edit_error)?;
            return Ok((edited, ops.len()));
        }
        EditAction::Update {
            path,
            name,
            field_type,
            description,
        } => {
            let patch = FieldPatch {
                name,
                field_type,
                description,
            };
            if patch.is_empty() {
                return Err(HelpfulError::new("Nothing to update")
                    .with_suggestion("TRY: Pass at least one of --name, --type, --description")
                    .into());
            }
            EditOp::UpdateField {
                path: parse_path(&path)?,
                patch,
            }
        }
        EditAction::Remove { path } => EditOp::RemoveField {
            path: parse_path(&path)?,
        },
        EditAction::AddProperty { parent } => EditOp::AddProperty {
            parent: parse_path(&parent)?,
        },
        EditAction::RemoveProperty { parent, name } => EditOp::RemoveProperty {
            parent: parse_path(&parent)?,
            name,
        },
        EditAction::SetDescription { description } => EditOp::SetDescription { description },
    };
    let edited = draft.apply(&op).map_err(edit_error)?;
    Ok((edited, 1))
}

fn edit_error(err: EditError) -> anyhow::Error {
    match &err {
        EditError::PathNotFound(path) | EditError::NotAnObject(path) => {
            HelpfulError::invalid_field_path(&path.to_string(), &err.to_string()).into()
        }
        _ => HelpfulError::new(err.to_string())
            .with_context("The edit was not applied")
            .into(),
    }
}

pub fn run(args: EditArgs) -> Result<()> {
    let mut template = load_template(&args.file)?;
    let (draft, applied) = apply_action(&template.to_draft(), args.action)?;
    template.update_from_draft(&draft);

    if !args.dry_run {
        template
            .save(&args.file)
            .map_err(|e| HelpfulError::from_template_error(&args.file, &e))?;
        info!(file = %args.file.display(), ops = applied, "saved edited template");
    }

    if args.json {
        return print_json(&template);
    }
    print_outline(&outline(template.fields()));
    if args.dry_run {
        println!("Dry run: {} not modified", args.file.display());
    } else {
        println!("Applied {} edit(s) to {}", applied, args.file.display());
    }
    Ok(())
}
