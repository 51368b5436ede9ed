//! dbt manifest parsing and text synthesis
//!
//! This crate handles:
//! - Parsing manifest.json into a typed schema, one entry at a time
//! - Resolving source/macro/node ids to display names
//! - Inferring which tests a node applies
//! - Flattening nodes, sources and columns into text units

pub mod manifest;
pub mod lookup;
pub mod test_detection;
pub mod synthesizer;

pub use manifest::{Manifest, ManifestNode, ManifestSource, ManifestMacro, ManifestMetadata, ColumnDefinition, DependsOn, RejectedEntry, ManifestError};
pub use lookup::{LookupTables, ResolvedDependencies, resolve_dependencies};
pub use test_detection::TestDetector;
pub use synthesizer::{ManifestSynthesizer, source_units};
