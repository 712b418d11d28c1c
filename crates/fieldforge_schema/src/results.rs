//! Extraction result files: JSON as returned, plus a flattened CSV.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Key added to every instance naming the document it came from.
pub const FILENAME_KEY: &str = "filename";

#[derive(Debug, Error)]
pub enum ResultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One extracted record.
pub type Instance = Map<String, Value>;

/// The payload of one extraction: `{instances: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// Paths written by [`ExtractionResult::write_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl ExtractionResult {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn from_json(content: &str) -> Result<Self, ResultError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ResultError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Tag every instance with the source document name.
    pub fn annotate_filename(&mut self, filename: &str) {
        for instance in &mut self.instances {
            instance.insert(FILENAME_KEY.to_string(), Value::String(filename.to_string()));
        }
    }

    /// Append the instances of another result (e.g. the next document).
    pub fn extend(&mut self, other: ExtractionResult) {
        self.instances.extend(other.instances);
    }

    pub fn to_json(&self) -> Result<String, ResultError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Column names: the union of flattened keys in first-seen order.
    pub fn csv_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for instance in &self.instances {
            for key in flatten_instance(instance).into_keys() {
                if !headers.contains(&key) {
                    headers.push(key);
                }
            }
        }
        headers
    }

    /// Write one CSV row per instance. Cells an instance lacks are empty.
    /// Nothing is written when there are no instances.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ResultError> {
        let headers = self.csv_headers();
        let mut csv_writer = csv::Writer::from_writer(writer);
        if headers.is_empty() {
            csv_writer.flush()?;
            return Ok(());
        }

        csv_writer.write_record(&headers)?;
        for instance in &self.instances {
            let flat = flatten_instance(instance);
            let row = headers
                .iter()
                .map(|header| flat.get(header).map(String::as_str).unwrap_or(""));
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, ResultError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write `<stem>.json` and `<stem>.csv` into `dir`, where the stem is
    /// `name` with every non-alphanumeric character replaced.
    pub fn write_files(&self, dir: &Path, name: &str) -> Result<ResultFiles, ResultError> {
        fs::create_dir_all(dir)?;
        let stem = output_stem(name);
        let files = ResultFiles {
            json: dir.join(format!("{}.json", stem)),
            csv: dir.join(format!("{}.csv", stem)),
        };

        fs::write(&files.json, self.to_json()?)?;
        let csv_file = fs::File::create(&files.csv)?;
        self.write_csv(csv_file)?;

        info!(
            instances = self.instances.len(),
            json = %files.json.display(),
            csv = %files.csv.display(),
            "wrote result files"
        );
        Ok(files)
    }
}

/// Flatten one instance into cell text keyed by dotted path.
///
/// Nested objects contribute `parent.child` keys (an empty object
/// contributes nothing). Arrays are kept whole as JSON text. Null becomes an
/// empty cell.
pub fn flatten_instance(instance: &Instance) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    flatten_into(instance, "", &mut out);
    out
}

fn flatten_into(object: &Instance, prefix: &str, out: &mut IndexMap<String, String>) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(child) => flatten_into(child, &path, out),
            Value::Null => {
                out.insert(path, String::new());
            }
            Value::String(text) => {
                out.insert(path, text.clone());
            }
            other => {
                out.insert(path, other.to_string());
            }
        }
    }
}

/// File stem for a result name: ASCII letters and digits kept, everything
/// else replaced with `_`.
pub fn output_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn result() -> ExtractionResult {
        serde_json::from_value(json!({
            "instances": [
                {
                    "title": "Paper A",
                    "year": 2021,
                    "venue": {"name": "ICSE", "city": null},
                    "authors": ["Ada", "Grace"]
                },
                {
                    "title": "Paper, B",
                    "open_access": true,
                    "venue": {}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_instance() {
        let flat = flatten_instance(&result().instances[0]);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "year", "venue.name", "venue.city", "authors"]);
        assert_eq!(flat["year"], "2021");
        assert_eq!(flat["venue.city"], "");
        assert_eq!(flat["authors"], r#"["Ada","Grace"]"#);
    }

    #[test]
    fn test_annotate_filename() {
        let mut result = result();
        result.annotate_filename("paper.pdf");
        assert!(result
            .instances
            .iter()
            .all(|i| i[FILENAME_KEY] == json!("paper.pdf")));
    }

    #[test]
    fn test_csv_union_headers() {
        let mut result = result();
        result.annotate_filename("a.pdf");
        let csv = result.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "title,year,venue.name,venue.city,authors,filename,open_access"
        );
        assert_eq!(lines[1], r#"Paper A,2021,ICSE,,"[""Ada"",""Grace""]",a.pdf,"#);
        assert_eq!(lines[2], r#""Paper, B",,,,,a.pdf,true"#);
    }

    #[test]
    fn test_empty_result_writes_nothing() {
        let csv = ExtractionResult::default().to_csv().unwrap();
        assert!(csv.is_empty());
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem("Run 3: invoices/2024"), "Run_3__invoices_2024");
        assert_eq!(output_stem("résumé"), "r_sum_");
    }

    #[test]
    fn test_write_files() {
        let temp = TempDir::new().unwrap();
        let mut result = result();
        result.annotate_filename("a.pdf");

        let files = result.write_files(&temp.path().join("out"), "My Run").unwrap();
        assert!(files.json.ends_with("My_Run.json"));
        assert!(files.csv.ends_with("My_Run.csv"));

        let back = ExtractionResult::load(&files.json).unwrap();
        assert_eq!(back, result);
        let csv = fs::read_to_string(&files.csv).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_extend() {
        let mut first = result();
        first.extend(result());
        assert_eq!(first.instances.len(), 4);
    }
}
