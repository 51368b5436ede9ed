//! dbt project scanning
//!
//! Walks a dbt project on disk and turns it into text units:
//! - compiled SQL models, one unit per file
//! - YAML schema files, rendered to readable summaries
//! - the manifest, via `chatdbt-dbt`
//!
//! [`ProjectLoader`] runs all three phases in that order. Every file is
//! handled on its own; a file that cannot be read is logged and skipped.

pub mod walk;
pub mod sql;
pub mod yaml;
pub mod loader;

pub use sql::{scan_sql, model_name};
pub use yaml::{scan_yaml, render_schema, SchemaFile, YamlModel, YamlSource, YamlColumn, YamlTable};
pub use loader::{ProjectLoader, LoadError};
