//! Check command - validate extracted instances against a template's contract

use anyhow::{Context, Result};
use clap::Args;
use fieldforge_schema::validate_extraction;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cli::error::HelpfulError;
use crate::cli::export::load_schema_file;
use crate::cli::output::{print_json, print_table};

/// Arguments for the `check` command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Template (or field list) the instances were extracted with
    pub template: PathBuf,

    /// Tool call payload: {"instances": [...]}
    pub result: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Returns whether every instance matched the contract.
pub fn run(args: CheckArgs) -> Result<bool> {
    let (fields, _) = load_schema_file(&args.template)?;

    if !args.result.exists() {
        return Err(HelpfulError::file_not_found(&args.result).into());
    }
    let content = std::fs::read_to_string(&args.result)
        .with_context(|| format!("Failed to read {}", args.result.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .map_err(|e| HelpfulError::json_parse_error(&args.result, &e.to_string()))?;

    let report = validate_extraction(&fields, &payload);
    if report.is_valid() {
        info!(instances = report.instances, "all instances match the contract");
    } else {
        warn!(
            instances = report.instances,
            violations = report.violations.len(),
            "instances do not match the contract"
        );
    }

    if args.json {
        print_json(&serde_json::json!({
            "valid": report.is_valid(),
            "instances": report.instances,
            "violations": report.violations,
        }))?;
        return Ok(report.is_valid());
    }

    if report.is_valid() {
        println!("OK: {} instance(s) match the contract", report.instances);
        return Ok(true);
    }

    let rows = report
        .violations
        .iter()
        .map(|v| {
            vec![
                v.path.clone(),
                v.kind.to_string(),
                v.expected.clone(),
                v.got.clone(),
            ]
        })
        .collect();
    print_table(&["PATH", "PROBLEM", "EXPECTED", "GOT"], rows);
    println!(
        "{} violation(s) in {} instance(s)",
        report.violations.len(),
        report.instances
    );
    Ok(false)
}
