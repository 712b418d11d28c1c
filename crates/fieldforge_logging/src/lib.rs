//! Logging setup and home directory layout for fieldforge binaries.
//!
//! Everything at the configured level goes to a daily log file under
//! `<home>/logs`; stderr only shows warnings unless running verbose.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "FIELDFORGE_HOME";

const HOME_DIR_NAME: &str = ".fieldforge";
const DEFAULT_LOG_FILTER: &str = "fieldforge=info,fieldforge_schema=info";
const QUIET_CONSOLE_FILTER: &str = "warn";
const MAX_LOG_FILES: usize = 5;

pub struct LogConfig<'a> {
    /// Log file base name
    pub app_name: &'a str,
    /// Mirror the file filter to stderr instead of warnings only
    pub verbose: bool,
}

/// Install the global subscriber: log file plus stderr.
///
/// `RUST_LOG` overrides the default filter for both outputs. Keep the
/// returned guard alive until exit so buffered lines reach the file.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    let log_dir = ensure_logs_dir()?;
    let appender = file_appender(&log_dir, config.app_name)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose || std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    } else {
        EnvFilter::new(QUIET_CONSOLE_FILTER)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!(log_dir = %log_dir.display(), app = config.app_name, "logging initialized");
    Ok(guard)
}

/// The fieldforge home directory: `$FIELDFORGE_HOME`, else `~/.fieldforge`.
pub fn fieldforge_home() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(HOME_DIR_NAME))
        .ok_or_else(|| anyhow!("Could not determine home directory; set {}", HOME_ENV))
}

/// `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(fieldforge_home()?.join("logs"))
}

pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Daily-rolled `<app>.<date>.log` files, keeping the newest
/// [`MAX_LOG_FILES`].
fn file_appender(dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_stem(app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}

fn log_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if stem.is_empty() {
        "fieldforge".to_string()
    } else {
        stem
    }
}
