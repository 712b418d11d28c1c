//! Results command - save an extraction payload as JSON and CSV files

use anyhow::Result;
use clap::Args;
use fieldforge_schema::ExtractionResult;
use std::path::PathBuf;

use crate::cli::config::{load_default_config, results_dir};
use crate::cli::error::HelpfulError;
use crate::cli::output::print_json;

/// Arguments for the `results` command
#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Tool call payload: {"instances": [...]}
    pub result: PathBuf,

    /// Source document name recorded on every instance
    #[arg(long)]
    pub filename: Option<String>,

    /// Directory for the output files (default from config)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Output file stem (defaults to the result file's stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ResultsArgs) -> Result<()> {
    let mut result = ExtractionResult::load(&args.result)
        .map_err(|e| HelpfulError::from_result_error(&args.result, &e))?;
    if let Some(filename) = &args.filename {
        result.annotate_filename(filename);
    }
    tracing::debug!(instances = result.instances.len(), "loaded extraction result");

    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => results_dir(&load_default_config()?)?,
    };
    let name = args.name.unwrap_or_else(|| {
        args.result
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".to_string())
    });

    let files = result
        .write_files(&out_dir, &name)
        .map_err(|e| HelpfulError::from_result_error(&out_dir, &e))?;
    if args.json {
        return print_json(&serde_json::json!({
            "instances": result.instances.len(),
            "files": files,
        }));
    }
    println!("Saved {} instance(s)", result.instances.len());
    println!("  JSON: {}", files.json.display());
    println!("  CSV:  {}", files.csv.display());
    Ok(())
}
