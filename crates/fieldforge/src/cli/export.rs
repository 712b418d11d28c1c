//! Export command - print the extraction contract for a template

use anyhow::Result;
use clap::Args;
use fieldforge_schema::template::{load_fields, Template};
use fieldforge_schema::{format_schema, tool_definition, ExtractionContract, SchemaField};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::config::load_default_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::print_json;

/// Arguments for the `export` command
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Template file, `{"fields": [...]}` document, or bare field array
    pub file: PathBuf,

    /// Wrap the contract in a strict tool-calling definition
    #[arg(long)]
    pub tool: bool,

    /// Emit the root contract object instead of the bare properties map
    #[arg(long, conflicts_with = "tool")]
    pub contract: bool,

    /// Tool name (default from config)
    #[arg(long, requires = "tool")]
    pub name: Option<String>,

    /// Contract description (defaults to the template's, then config)
    #[arg(long)]
    pub description: Option<String>,
}

/// Fields plus the description stored alongside them, if any.
pub(crate) fn load_schema_file(path: &Path) -> Result<(Vec<SchemaField>, Option<String>)> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    // Full templates carry a description; other documents only have fields
    if let Ok(template) = Template::load(path) {
        let description = Some(template.description.clone()).filter(|d| !d.trim().is_empty());
        return Ok((template.schema.fields, description));
    }
    let fields = load_fields(path).map_err(|e| HelpfulError::from_template_error(path, &e))?;
    Ok((fields, None))
}

pub fn run(args: ExportArgs) -> Result<()> {
    let config = load_default_config()?;
    let (fields, stored_description) = load_schema_file(&args.file)?;
    let description = args
        .description
        .or(stored_description)
        .unwrap_or(config.export.default_description);

    info!(file = %args.file.display(), fields = fields.len(), tool = args.tool, "exporting contract");

    if args.tool {
        let name = args.name.unwrap_or(config.export.tool_name);
        print_json(&tool_definition(name, description, &fields))
    } else if args.contract {
        print_json(&ExtractionContract::new(description, &fields))
    } else {
        print_json(&format_schema(&fields))
    }
}
