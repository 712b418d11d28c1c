mod cli_support;

use cli_support::{args, run_cli, run_cli_json, TestHome};
use serde_json::Value;
use std::fs;

#[test]
fn test_config_json_defaults() {
    let home = TestHome::new();

    let config: Value = run_cli_json(&args(["config", "--json"]), &home.envs());
    assert_eq!(config["home"], home.path().to_string_lossy().to_string());
    assert_eq!(config["config"]["exists"], false);
    assert_eq!(config["settings"]["import"]["delimiter"], ",");
    assert_eq!(config["settings"]["export"]["tool_name"], "extraction_tool");
    assert_eq!(
        config["results"]["path"],
        home.path().join("output").to_string_lossy().to_string()
    );
    // Logging creates the logs directory on startup
    assert_eq!(config["logs"]["exists"], true);
}

#[test]
fn test_config_json_reads_file() {
    let home = TestHome::new();
    fs::write(
        home.path().join("config.toml"),
        "[export]\ntool_name = \"invoices\"\n\n[results]\nout_dir = \"/tmp/fieldforge-results\"\n",
    )
    .unwrap();

    let config: Value = run_cli_json(&args(["config", "--json"]), &home.envs());
    assert_eq!(config["config"]["exists"], true);
    assert_eq!(config["settings"]["export"]["tool_name"], "invoices");
    assert_eq!(config["results"]["path"], "/tmp/fieldforge-results");
}

#[test]
fn test_invalid_config_fails() {
    let home = TestHome::new();
    fs::write(home.path().join("config.toml"), "[import\n").unwrap();

    let output = run_cli(&args(["config", "--json"]), &home.envs());
    assert!(!output.status.success());
}
