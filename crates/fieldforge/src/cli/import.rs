//! Import command - build a field tree from spreadsheet rows

use anyhow::Result;
use clap::Args;
use fieldforge_schema::import::read_rows_from_path;
use fieldforge_schema::{import_rows, outline, SchemaDraft, Template};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cli::config::load_default_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_outline};

/// Arguments for the `import` command
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file with a header row and columns: path, type, description
    pub file: PathBuf,

    /// Column delimiter (default from config, else ',')
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Save the imported fields as a template at this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template name (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Template description
    #[arg(long)]
    pub description: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let config = load_default_config()?;
    let delimiter = args.delimiter.unwrap_or(config.import.delimiter);
    if !delimiter.is_ascii() {
        return Err(HelpfulError::invalid_delimiter(delimiter).into());
    }

    let rows = read_rows_from_path(&args.file, delimiter as u8)
        .map_err(|e| HelpfulError::from_import_error(&args.file, &e))?;
    let outcome = import_rows(&rows);
    info!(
        file = %args.file.display(),
        rows = rows.len(),
        fields = outcome.fields.len(),
        skipped = outcome.skipped_rows,
        "imported spreadsheet"
    );
    for warning in &outcome.warnings {
        warn!("{}", warning);
    }

    let saved = match &args.output {
        Some(path) => {
            let name = args.name.clone().unwrap_or_else(|| {
                args.file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "template".to_string())
            });
            let description = args
                .description
                .clone()
                .unwrap_or_else(|| config.export.default_description.clone());
            let draft = SchemaDraft::new(description, outcome.fields.clone());
            let template = Template::from_draft(name, &draft);
            template
                .save(path)
                .map_err(|e| HelpfulError::from_template_error(path, &e))?;
            Some(path.clone())
        }
        None => None,
    };

    if args.json {
        let value = serde_json::json!({
            "fields": outcome.fields,
            "skipped_rows": outcome.skipped_rows,
            "warnings": outcome.warnings,
            "saved_to": saved.as_ref().map(|p| p.to_string_lossy()),
        });
        return print_json(&value);
    }

    for warning in &outcome.warnings {
        println!("WARNING: {}", warning);
    }
    if outcome.is_empty() {
        return Ok(());
    }
    print_outline(&outline(&outcome.fields));
    println!(
        "{} top-level field(s), {} row(s) skipped",
        outcome.fields.len(),
        outcome.skipped_rows
    );
    if let Some(path) = saved {
        println!("Saved template: {}", path.display());
    }
    Ok(())
}
