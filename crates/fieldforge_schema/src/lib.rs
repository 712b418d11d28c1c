//! Extraction Schema Core
//!
//! # Lifecycle of an extraction schema
//!
//! 1. **Import**: Spreadsheet rows (`path, type, description`) become a field tree
//! 2. **Edit**: The tree is held in a [`SchemaDraft`] and changed one operation at a time
//! 3. **Save**: Named, described trees are kept as [`Template`] JSON files
//! 4. **Export**: The tree becomes a JSON-Schema-shaped contract and a strict tool definition
//! 5. **Check**: Extracted instances are validated against that contract, then written out
//!
//! The tree is a sum type: an array always has exactly one items descriptor,
//! an object always has a (possibly empty) property map, and scalars have
//! neither. Invalid shapes are rejected when JSON is read, never represented.
//!
//! # Modules
//!
//! - [`field`]: The field tree, types and structural validation
//! - [`path`]: Addressing nodes (`0.lines.[].sku`)
//! - [`import`]: Spreadsheet rows to field tree
//! - [`export`]: Field tree to contract and tool definition
//! - [`editor`]: Functional-update edit operations
//! - [`template`]: Saved templates
//! - [`instance`]: Validating extracted records
//! - [`results`]: JSON and flattened CSV result files

pub mod editor;
pub mod export;
pub mod field;
pub mod import;
pub mod instance;
pub mod path;
pub mod results;
pub mod template;

pub use field::{
    outline, validate_fields, FieldError, FieldKind, FieldType, OutlineRow, Properties,
    SchemaField, DEFAULT_ITEMS_NAME,
};
pub use path::{FieldPath, PathParseError, PathStep};

// Re-export key types from import/export
pub use export::{
    export_field, format_schema, tool_definition, ContractProperties, ExtractionContract,
    FieldSpec, ToolDefinition, DEFAULT_TOOL_NAME,
};
pub use import::{build_schema, import_rows, ImportError, ImportOutcome, ImportWarning};

// Re-export key types from editing and persistence
pub use editor::{EditError, EditOp, FieldPatch, SchemaDraft, DEFAULT_DRAFT_DESCRIPTION};
pub use template::{load_fields, Template, TemplateError};

pub use instance::{
    validate_extraction, validate_instance, ExtractionReport, InstanceViolation,
    InstanceViolationKind,
};
pub use results::{output_stem, ExtractionResult, ResultError, ResultFiles};
