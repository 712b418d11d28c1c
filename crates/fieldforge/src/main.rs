//! fieldforge
//!
//! Build structured extraction schemas from spreadsheets, edit them as
//! templates, export them as tool-calling contracts, and check and save the
//! instances a model returns.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldforge_logging::{init_logging, LogConfig};
use std::process::ExitCode;

mod cli;

/// Exit code when `check` finds violations
const EXIT_VIOLATIONS: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "fieldforge", version, about = "Extraction schema builder")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a field tree from a path/type/description spreadsheet
    Import(cli::import::ImportArgs),

    /// Print the extraction contract for a template
    Export(cli::export::ExportArgs),

    /// Create, show and validate templates
    Template {
        #[command(subcommand)]
        action: cli::template::TemplateAction,
    },

    /// Edit the fields of a saved template
    Edit(cli::edit::EditArgs),

    /// Check extracted instances against a template
    Check(cli::check::CheckArgs),

    /// Save extracted instances as JSON and CSV
    Results(cli::results::ResultsArgs),

    /// Show resolved paths and settings
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Import(args) => args.json,
        Commands::Template { action } => action.wants_json(),
        Commands::Edit(args) => args.json,
        Commands::Check(args) => args.json,
        Commands::Results(args) => args.json,
        Commands::Config(args) => args.json,
        // export always prints JSON
        Commands::Export(_) => true,
    }
}

fn run_command(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Import(args) => cli::import::run(args)?,
        Commands::Export(args) => cli::export::run(args)?,
        Commands::Template { action } => cli::template::run(action)?,
        Commands::Edit(args) => cli::edit::run(args)?,
        Commands::Check(args) => {
            if !cli::check::run(args)? {
                return Ok(ExitCode::from(EXIT_VIOLATIONS));
            }
        }
        Commands::Results(args) => cli::results::run(args)?,
        Commands::Config(args) => cli::config::run(args)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let _log_guard = match init_logging(LogConfig {
        app_name: "fieldforge",
        verbose: cli.verbose,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };

    match run_command(cli.command) {
        Ok(code) => code,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
