//! Tabular import: spreadsheet rows -> field tree
//!
//! Each row after the header is `[path, type, description]`, where `path` is a
//! dot-separated location such as `order.items.sku`. Intermediate segments
//! become object fields. A child attached under a parent whose name ends in
//! `s` turns that parent into an array of objects (`items` -> array whose
//! items descriptor is an object named `item`).
//!
//! The plural rule is a naming convention, not a structural guarantee:
//! `address.street` also treats `address` as a plural. Existing spreadsheets
//! depend on it, so it is kept as-is.

use crate::field::{FieldType, Properties, SchemaField};
use indexmap::map::Entry;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub const PATH_COLUMN: usize = 0;
pub const TYPE_COLUMN: usize = 1;
pub const DESCRIPTION_COLUMN: usize = 2;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },
}

/// Recoverable problems found while importing. Rows are never rejected with
/// an error; they are skipped or defaulted and reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// Type column held something other than the five supported types; the
    /// field was imported as a string.
    UnknownType { row: usize, value: String },

    /// Path had an empty segment (`a..b`, trailing dot); the row was skipped.
    MalformedPath { row: usize, path: String },

    /// A later row retyped a node that had children; the children were
    /// discarded.
    DroppedChildren { row: usize, path: String },

    /// Nothing could be extracted from the input.
    EmptyExtraction,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::UnknownType { row, value } => {
                write!(f, "Row {}: unknown type '{}', imported as string", row, value)
            }
            ImportWarning::MalformedPath { row, path } => {
                write!(f, "Row {}: malformed path '{}', row skipped", row, path)
            }
            ImportWarning::DroppedChildren { row, path } => write!(
                f,
                "Row {}: '{}' retyped as a scalar, its nested fields were dropped",
                row, path
            ),
            ImportWarning::EmptyExtraction => write!(
                f,
                "Could not extract fields from the template file. \
                 The file might be empty or not in the expected format."
            ),
        }
    }
}

/// Result of importing a row list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub fields: Vec<SchemaField>,
    /// Rows ignored because they had no usable path
    pub skipped_rows: usize,
    pub warnings: Vec<ImportWarning>,
}

impl ImportOutcome {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Build the top-level field list from spreadsheet rows. Row 0 is a header.
pub fn build_schema<R, S>(rows: &[R]) -> Vec<SchemaField>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    import_rows(rows).fields
}

/// Like [`build_schema`], also reporting skipped rows and warnings.
pub fn import_rows<R, S>(rows: &[R]) -> ImportOutcome
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut builder = TreeBuilder::default();
    let mut outcome = ImportOutcome::default();

    for (row_index, row) in rows.iter().enumerate().skip(1) {
        let row = row.as_ref();
        let cell = move |column: usize| row.get(column).map(|c| c.as_ref().trim()).unwrap_or("");

        let path = cell(PATH_COLUMN);
        if path.is_empty() {
            debug!(row = row_index, "skipping row without path");
            outcome.skipped_rows += 1;
            continue;
        }

        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            warn!(row = row_index, path, "skipping row with malformed path");
            outcome.skipped_rows += 1;
            outcome.warnings.push(ImportWarning::MalformedPath {
                row: row_index,
                path: path.to_string(),
            });
            continue;
        }

        let raw_type = cell(TYPE_COLUMN);
        let field_type = if raw_type.is_empty() {
            FieldType::String
        } else {
            match raw_type.parse::<FieldType>() {
                Ok(field_type) => field_type,
                Err(_) => {
                    warn!(row = row_index, value = raw_type, "unknown field type, using string");
                    outcome.warnings.push(ImportWarning::UnknownType {
                        row: row_index,
                        value: raw_type.to_string(),
                    });
                    FieldType::String
                }
            }
        };

        let leaf = Leaf {
            field_type,
            description: cell(DESCRIPTION_COLUMN),
        };
        if builder.insert(&segments, &leaf) {
            warn!(row = row_index, path, "row retyped a field with children, dropping them");
            outcome.warnings.push(ImportWarning::DroppedChildren {
                row: row_index,
                path: path.to_string(),
            });
        }
    }

    outcome.fields = builder.roots;
    if outcome.fields.is_empty() {
        warn!(rows = rows.len(), "import produced no fields");
        outcome.warnings.push(ImportWarning::EmptyExtraction);
    }
    outcome
}

/// Read raw spreadsheet rows from CSV. The header row is returned like any
/// other row; rows may have differing lengths.
pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Vec<String>>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|source| ImportError::Csv {
            line: index + 1,
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>, ImportError> {
    let file = File::open(path)?;
    read_rows(file, delimiter)
}

struct Leaf<'a> {
    field_type: FieldType,
    description: &'a str,
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<SchemaField>,
}

impl TreeBuilder {
    /// Returns true when the row discarded existing children.
    fn insert(&mut self, segments: &[&str], leaf: &Leaf<'_>) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            return false;
        };
        let is_last = rest.is_empty();

        let index = match self.roots.iter().position(|f| f.name == *first) {
            Some(index) => {
                if is_last {
                    return finish_leaf(&mut self.roots[index], leaf);
                }
                index
            }
            None => {
                self.roots.push(new_node(first, is_last, leaf));
                self.roots.len() - 1
            }
        };

        !is_last && attach(&mut self.roots[index], rest, leaf)
    }
}

fn new_node(name: &str, is_last: bool, leaf: &Leaf<'_>) -> SchemaField {
    if is_last {
        SchemaField::new(name, leaf.field_type).with_description(leaf.description)
    } else {
        SchemaField::new(name, FieldType::Object)
    }
}

/// Place `segments` (the remainder of a path) under `parent`.
fn attach(parent: &mut SchemaField, segments: &[&str], leaf: &Leaf<'_>) -> bool {
    let Some((name, rest)) = segments.split_first() else {
        return false;
    };
    let is_last = rest.is_empty();

    let container = child_container(parent);
    let child = match container.entry(name.to_string()) {
        Entry::Occupied(entry) => {
            let child = entry.into_mut();
            if is_last {
                return finish_leaf(child, leaf);
            }
            child
        }
        Entry::Vacant(entry) => entry.insert(new_node(name, is_last, leaf)),
    };

    !is_last && attach(child, rest, leaf)
}

/// The property map a child of `parent` belongs in, reshaping `parent` when
/// the plural rule or an explicit array type calls for it.
fn child_container(parent: &mut SchemaField) -> &mut Properties {
    if parent.field_type() != FieldType::Array {
        if !is_plural(&parent.name) {
            return parent.object_properties_mut();
        }
        debug!(field = %parent.name, "plural name, treating as array of objects");
        wrap_into_array(parent);
    }

    let items_name = singular(&parent.name);
    let items = parent.array_items_mut();
    if items.field_type() != FieldType::Object {
        *items = SchemaField::new(items_name, FieldType::Object);
    }
    items.object_properties_mut()
}

/// A later row naming an existing node sets its type and description.
/// Returns true when a retype discarded properties or an items object.
fn finish_leaf(field: &mut SchemaField, leaf: &Leaf<'_>) -> bool {
    let has_object_items = field
        .items()
        .is_some_and(|items| items.field_type() == FieldType::Object);
    let has_properties = field.properties().is_some_and(|p| !p.is_empty());

    let dropped = match (field.field_type(), leaf.field_type) {
        // Children already inferred the array shape; an "object" row does not undo it
        (FieldType::Array, FieldType::Object) if has_object_items => false,
        (FieldType::Object, FieldType::Array) if has_properties => {
            wrap_into_array(field);
            false
        }
        (current, target) => {
            field.set_type(target);
            current != target && (has_properties || has_object_items)
        }
    };
    field.set_description(leaf.description);
    dropped
}

/// Turn `field` into an array whose items object takes over any existing
/// properties.
fn wrap_into_array(field: &mut SchemaField) {
    let properties = field.properties_mut().map(std::mem::take).unwrap_or_default();
    let mut items = SchemaField::new(singular(&field.name), FieldType::Object);
    *items.object_properties_mut() = properties;
    *field.array_items_mut() = items;
}

fn is_plural(name: &str) -> bool {
    name.ends_with('s')
}

/// `name` without its trailing `s`; a bare `s` stays as is.
fn singular(name: &str) -> String {
    name.strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .unwrap_or(name)
        .to_string()
}
