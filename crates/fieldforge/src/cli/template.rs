//! Template commands - create, inspect and validate saved templates

use anyhow::Result;
use clap::Subcommand;
use fieldforge_schema::template::load_fields;
use fieldforge_schema::{outline, Template};
use std::path::{Path, PathBuf};

use crate::cli::config::load_default_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::{format_timestamp, print_json, print_outline};

#[derive(Debug, Subcommand)]
pub enum TemplateAction {
    /// Create a template file
    New {
        /// Template name
        name: String,

        /// Where to write the template
        #[arg(short, long)]
        output: PathBuf,

        /// Template description (default from config)
        #[arg(long)]
        description: Option<String>,

        /// Start from the fields of a JSON document (template, {"fields": [...]}, or array)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a template's metadata and fields
    Show {
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a template file is well formed
    Validate {
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl TemplateAction {
    pub fn wants_json(&self) -> bool {
        match self {
            TemplateAction::New { json, .. }
            | TemplateAction::Show { json, .. }
            | TemplateAction::Validate { json, .. } => *json,
        }
    }
}

pub fn run(action: TemplateAction) -> Result<()> {
    match action {
        TemplateAction::New {
            name,
            output,
            description,
            from,
            force,
            json,
        } => run_new(name, &output, description, from.as_deref(), force, json),
        TemplateAction::Show { file, json } => run_show(&file, json),
        TemplateAction::Validate { file, json } => run_validate(&file, json),
    }
}

/// Load a template, turning failures into helpful errors
pub(crate) fn load_template(path: &Path) -> Result<Template> {
    Template::load(path).map_err(|e| HelpfulError::from_template_error(path, &e).into())
}

fn run_new(
    name: String,
    output: &Path,
    description: Option<String>,
    from: Option<&Path>,
    force: bool,
    json: bool,
) -> Result<()> {
    if output.exists() && !force {
        return Err(HelpfulError::new(format!("File already exists: {}", output.display()))
            .with_context("template new will not overwrite an existing template")
            .with_suggestion("TRY: Pass --force to replace it")
            .into());
    }

    let fields = match from {
        Some(source) => {
            load_fields(source).map_err(|e| HelpfulError::from_template_error(source, &e))?
        }
        None => Vec::new(),
    };
    let description = match description {
        Some(description) => description,
        None => load_default_config()?.export.default_description,
    };

    let template = Template::new(name, description, fields);
    template
        .save(output)
        .map_err(|e| HelpfulError::from_template_error(output, &e))?;

    if json {
        return print_json(&template);
    }
    println!("Created template '{}' ({})", template.name, template.id);
    println!("  File:   {}", output.display());
    println!("  Fields: {}", template.fields().len());
    Ok(())
}

fn run_show(path: &Path, json: bool) -> Result<()> {
    let template = load_template(path)?;
    if json {
        return print_json(&template);
    }

    println!("TEMPLATE: {}", template.name);
    println!("  ID:          {}", template.id);
    println!("  Description: {}", template.description);
    println!("  Created:     {}", format_timestamp(&template.created_at));
    if let Some(updated) = &template.last_updated_at {
        println!("  Updated:     {}", format_timestamp(updated));
    }
    println!();

    if template.fields().is_empty() {
        println!("No fields.");
        return Ok(());
    }
    print_outline(&outline(template.fields()));
    println!();
    println!("Paths for `fieldforge edit`:");
    for (index, field) in template.fields().iter().enumerate() {
        println!("  {:<4}{}", index, field.name);
    }
    Ok(())
}

fn run_validate(path: &Path, json: bool) -> Result<()> {
    let template = load_template(path)?;
    let nodes = outline(template.fields()).len();

    if json {
        return print_json(&serde_json::json!({
            "valid": true,
            "name": template.name,
            "fields": template.fields().len(),
            "nodes": nodes,
        }));
    }
    println!(
        "OK: '{}' has {} top-level field(s), {} node(s)",
        template.name,
        template.fields().len(),
        nodes
    );
    Ok(())
}
