//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use fieldforge_schema::{ImportError, ResultError, TemplateError};
use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug, Serialize)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// File does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    parent_display(path)
                ),
            ])
    }

    /// File cannot be read or written
    pub fn cannot_access_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot access file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Ensure the file is not open in another program".to_string(),
            ])
    }

    /// CSV parsing error
    pub fn csv_parse_error(path: &Path, line: usize, details: &str) -> Self {
        Self::new(format!("CSV parse error at line {}: {}", line, details))
            .with_context(format!("Failed to parse spreadsheet rows: {}", path.display()))
            .with_suggestions([
                "TRY: Check if the delimiter is correct (use --delimiter)".to_string(),
                "TRY: Columns must be: path, type, description".to_string(),
                format!("TRY: Inspect the raw file: head -n {} {}", line + 5, path.display()),
            ])
    }

    /// JSON parsing error
    pub fn json_parse_error(path: &Path, details: &str) -> Self {
        Self::new(format!("JSON parse error: {}", details))
            .with_context(format!("Failed to parse JSON file: {}", path.display()))
            .with_suggestions([
                format!("TRY: Validate the JSON: python -m json.tool {}", path.display()),
                "TRY: Field types must be one of: string, number, boolean, array, object".to_string(),
            ])
    }

    /// Template or field list is structurally invalid
    pub fn invalid_template(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid template: {}", details))
            .with_context(format!("Template file: {}", path.display()))
            .with_suggestions([
                "TRY: Every field needs a non-empty name".to_string(),
                "TRY: Top-level field names must be unique".to_string(),
                format!("TRY: Inspect the fields: fieldforge template show {}", path.display()),
            ])
    }

    /// Field path argument could not be parsed or resolved
    pub fn invalid_field_path(path: &str, details: &str) -> Self {
        Self::new(format!("Invalid field path '{}': {}", path, details))
            .with_context("Paths start with a top-level index, then property names or [] for array items")
            .with_suggestions([
                "TRY: Examples: 0, 1.address, 2.[].sku".to_string(),
                "TRY: List paths with: fieldforge template show FILE".to_string(),
            ])
    }

    /// Delimiter must be a single ASCII character
    pub fn invalid_delimiter(delimiter: char) -> Self {
        Self::new(format!("Invalid delimiter: '{}'", delimiter))
            .with_context("The delimiter must be a single ASCII character")
            .with_suggestion("TRY: --delimiter ';'")
    }

    /// Map a template load/save failure
    pub fn from_template_error(path: &Path, err: &TemplateError) -> Self {
        match err {
            TemplateError::Io(io) if io.kind() == ErrorKind::NotFound => Self::file_not_found(path),
            TemplateError::Io(io) => Self::cannot_access_file(path, &io.to_string()),
            TemplateError::Json(json) => Self::json_parse_error(path, &json.to_string()),
            TemplateError::EmptyName | TemplateError::Field(_) => {
                Self::invalid_template(path, &err.to_string())
            }
        }
    }

    /// Map a spreadsheet read failure
    pub fn from_import_error(path: &Path, err: &ImportError) -> Self {
        match err {
            ImportError::Io(io) if io.kind() == ErrorKind::NotFound => Self::file_not_found(path),
            ImportError::Io(io) => Self::cannot_access_file(path, &io.to_string()),
            ImportError::Csv { line, source } => {
                Self::csv_parse_error(path, *line, &source.to_string())
            }
        }
    }

    /// Map a result file read/write failure
    pub fn from_result_error(path: &Path, err: &ResultError) -> Self {
        match err {
            ResultError::Io(io) if io.kind() == ErrorKind::NotFound => Self::file_not_found(path),
            ResultError::Io(io) => Self::cannot_access_file(path, &io.to_string()),
            ResultError::Json(json) => Self::json_parse_error(path, &json.to_string())
                .with_suggestion("TRY: Result files look like {\"instances\": [{...}, ...]}"),
            ResultError::Csv(csv) => Self::cannot_access_file(path, &csv.to_string()),
        }
    }
}

fn parent_display(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string())
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a failed command as `{"error": {...}}` on stdout for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({ "error": helpful }),
        None => serde_json::json!({
            "error": {
                "message": err.to_string(),
                "context": err.chain().nth(1).map(|cause| cause.to_string()),
                "suggestions": [],
            }
        }),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{}", text),
        Err(_) => eprintln!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While importing rows")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While importing rows"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_file_not_found() {
        let path = PathBuf::from("/nonexistent/template.json");
        let display = HelpfulError::file_not_found(&path).to_string();
        assert!(display.contains("/nonexistent/template.json"));
        assert!(display.contains("TRY: Look for similar files: ls /nonexistent"));
    }

    #[test]
    fn test_template_error_mapping() {
        let path = PathBuf::from("t.json");
        let err = TemplateError::EmptyName;
        let helpful = HelpfulError::from_template_error(&path, &err);
        assert!(helpful.message.starts_with("Invalid template"));

        let io = std::io::Error::new(ErrorKind::NotFound, "gone");
        let helpful = HelpfulError::from_template_error(&path, &TemplateError::Io(io));
        assert!(helpful.message.starts_with("File not found"));
        assert!(helpful.to_string().contains("ls ."));
    }

    #[test]
    fn test_serializes_without_empty_context() {
        let value = serde_json::to_value(HelpfulError::new("boom")).unwrap();
        assert_eq!(value["message"], "boom");
        assert!(value.get("context").is_none());
        assert_eq!(value["suggestions"], serde_json::json!([]));
    }
}
