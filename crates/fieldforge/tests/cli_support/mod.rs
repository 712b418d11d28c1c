#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn fieldforge_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fieldforge"))
}

/// Temp home plus the environment every test runs the binary with.
pub struct TestHome {
    pub dir: TempDir,
    home: String,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp home");
        let home = dir.path().to_string_lossy().to_string();
        Self { dir, home }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn envs(&self) -> [(&str, &str); 2] {
        [("FIELDFORGE_HOME", self.home.as_str()), ("RUST_LOG", "error")]
    }
}

pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| s.as_ref().to_string()).collect()
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn run_cli(args: &[String], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(fieldforge_bin());
    cmd.args(args);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute fieldforge CLI")
}

pub fn parse_json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout
        .find(|c| c == '{' || c == '[')
        .unwrap_or_else(|| {
            panic!(
                "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
                stdout,
                String::from_utf8_lossy(&output.stderr)
            )
        });
    let json_text = &stdout[json_start..];
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn assert_cli_success(output: &Output, args: &[String]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn run_cli_json<T: DeserializeOwned>(args: &[String], envs: &[(&str, &str)]) -> T {
    let output = run_cli(args, envs);
    assert_cli_success(&output, args);
    let value = parse_json_output(&output);
    serde_json::from_value(value).unwrap_or_else(|err| {
        panic!(
            "failed to deserialize JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn run_cli_json_error(args: &[String], envs: &[(&str, &str)]) -> serde_json::Value {
    let output = run_cli(args, envs);
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    parse_json_output(&output)
}
