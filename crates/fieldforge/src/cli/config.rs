//! Configuration for fieldforge
//!
//! Reads optional settings from `~/.fieldforge/config.toml`. Every key has a
//! default, so a missing file or a partial file is fine.

use anyhow::Result;
use fieldforge_logging::{fieldforge_home, logs_dir};
use fieldforge_schema::{DEFAULT_DRAFT_DESCRIPTION, DEFAULT_TOOL_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldforgeConfig {
    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Column separator for spreadsheet CSV files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Tool name in generated tool definitions
    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    /// Contract description when neither the template nor the command gives one
    #[serde(default = "default_description")]
    pub default_description: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            default_description: default_description(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Where result files go; relative paths are under the home directory
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_tool_name() -> String {
    DEFAULT_TOOL_NAME.to_string()
}

fn default_description() -> String {
    DEFAULT_DRAFT_DESCRIPTION.to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Load configuration from a file; a missing file yields defaults.
pub fn load_config(config_path: &Path) -> Result<FieldforgeConfig, ConfigError> {
    if !config_path.exists() {
        return Ok(FieldforgeConfig::default());
    }
    let content = std::fs::read_to_string(config_path)?;
    Ok(toml::from_str(&content)?)
}

/// `~/.fieldforge/config.toml`
pub fn config_path() -> Result<PathBuf> {
    Ok(fieldforge_home()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default location
pub fn load_default_config() -> Result<FieldforgeConfig> {
    let path = config_path()?;
    let config = load_config(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?;
    Ok(config)
}

/// Resolved result directory: absolute as configured, else under the home directory.
pub fn results_dir(config: &FieldforgeConfig) -> Result<PathBuf> {
    if config.results.out_dir.is_absolute() {
        return Ok(config.results.out_dir.clone());
    }
    Ok(fieldforge_home()?.join(&config.results.out_dir))
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows resolved paths and settings
pub fn run(args: ConfigArgs) -> Result<()> {
    let home = fieldforge_home()?;
    let config_file = config_path()?;
    let logs = logs_dir()?;
    let config = load_default_config()?;
    let results = results_dir(&config)?;

    if args.json {
        let value = serde_json::json!({
            "home": home.to_string_lossy(),
            "config": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
            "results": {
                "path": results.to_string_lossy(),
                "exists": results.exists(),
            },
            "settings": config,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let exists = |path: &Path| if path.exists() { "exists" } else { "not found" };
    println!("FIELDFORGE CONFIGURATION");
    println!("========================");
    println!();
    println!("Home:     {}", home.display());
    println!("Config:   {} ({})", config_file.display(), exists(&config_file));
    println!("Logs:     {} ({})", logs.display(), exists(&logs));
    println!("Results:  {} ({})", results.display(), exists(&results));
    println!();
    println!("Import delimiter:     {:?}", config.import.delimiter);
    println!("Tool name:            {}", config.export.tool_name);
    println!("Default description:  {}", config.export.default_description);

    Ok(())
}
