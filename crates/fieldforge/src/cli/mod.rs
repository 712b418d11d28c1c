//! CLI module for fieldforge
//!
//! Each command lives in its own module with an `Args` struct and a `run`
//! function. Commands that accept `--json` report failures as JSON too.

pub mod error;
pub mod output;

pub mod check;
pub mod config;
pub mod edit;
pub mod export;
pub mod import;
pub mod results;
pub mod template;
