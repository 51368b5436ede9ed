//! Text units handed to the indexing collaborator
//!
//! Every unit is a `(content, metadata)` pair. The variants share that shape
//! and differ only in which metadata keys they carry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the unit kind tag
pub const KIND_KEY: &str = "file_type";

/// Metadata key holding the input file format (`sql`, `yaml`, `json`)
pub const FORMAT_KEY: &str = "format";

/// A metadata value attached to a text unit
///
/// Serialized untagged so units come out as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    List(Vec<String>),
}

impl MetadataValue {
    /// Borrow as a string, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a list, if this is a list value
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Which producer a unit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Raw SQL of one compiled model file
    SqlModel,

    /// Rendered summary of one YAML schema file
    Schema,

    /// One manifest node or source
    ManifestResource,

    /// One column of a manifest node or source
    ManifestColumn,
}

impl UnitKind {
    /// Stable tag stored under [`KIND_KEY`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlModel => "sql_model",
            Self::Schema => "schema",
            Self::ManifestResource => "manifest_resource",
            Self::ManifestColumn => "manifest_column",
        }
    }

    /// Parse a tag back into a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sql_model" => Some(Self::SqlModel),
            "schema" => Some(Self::Schema),
            "manifest_resource" => Some(Self::ManifestResource),
            "manifest_column" => Some(Self::ManifestColumn),
            _ => None,
        }
    }

    /// Origin label stored under the `source` key
    fn origin(&self) -> &'static str {
        match self {
            Self::SqlModel => "dbt_model",
            Self::Schema => "dbt_schema",
            Self::ManifestResource | Self::ManifestColumn => "dbt_manifest",
        }
    }

    /// Format of the file the unit was read from, stored under [`FORMAT_KEY`]
    pub fn file_format(&self) -> &'static str {
        match self {
            Self::SqlModel => "sql",
            Self::Schema => "yaml",
            Self::ManifestResource | Self::ManifestColumn => "json",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata describing one manifest resource (node or source)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMeta {
    pub unique_id: String,
    pub resource_type: String,
    pub name: String,
    pub alias: String,
    pub file_path: String,
    pub depends_on_models: Vec<String>,
    pub depends_on_sources: Vec<String>,
    pub tests: Vec<String>,
}

/// Metadata describing one column of a manifest resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    pub parent_unique_id: String,
    pub parent_resource_type: String,
    pub parent_name: String,
    pub column_name: String,
    /// Only set when the manifest declares a type
    pub data_type: Option<String>,
}

/// Unique id of a column unit, derived from its parent and the column name
pub fn column_unique_id(parent_unique_id: &str, column_name: &str) -> String {
    format!("{}__column__{}", parent_unique_id, column_name)
}

/// The atomic output of a scan: readable content plus structured metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Human-readable prose (never empty)
    pub content: String,

    /// Structured metadata (always present)
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl TextUnit {
    fn with_kind(kind: UnitKind, content: String) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(KIND_KEY.to_string(), kind.as_str().into());
        metadata.insert("source".to_string(), kind.origin().into());
        metadata.insert(FORMAT_KEY.to_string(), kind.file_format().into());

        Self { content, metadata }
    }

    /// A compiled SQL model file
    pub fn sql_model(content: impl Into<String>, file_path: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self::with_kind(UnitKind::SqlModel, content.into())
            .with_meta("file_path", file_path.into())
            .with_meta("model_name", model_name.into())
    }

    /// A rendered YAML schema file
    pub fn schema(content: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self::with_kind(UnitKind::Schema, content.into())
            .with_meta("file_path", file_path.into())
    }

    /// A manifest node or source
    pub fn manifest_resource(content: impl Into<String>, meta: ResourceMeta) -> Self {
        Self::with_kind(UnitKind::ManifestResource, content.into())
            .with_meta("unique_id", meta.unique_id)
            .with_meta("resource_type", meta.resource_type)
            .with_meta("name", meta.name)
            .with_meta("alias", meta.alias)
            .with_meta("file_path", meta.file_path)
            .with_meta("depends_on_models", meta.depends_on_models)
            .with_meta("depends_on_sources", meta.depends_on_sources)
            .with_meta("tests", meta.tests)
    }

    /// A column of a manifest node or source
    pub fn manifest_column(content: impl Into<String>, meta: ColumnMeta) -> Self {
        let unique_id = column_unique_id(&meta.parent_unique_id, &meta.column_name);

        let unit = Self::with_kind(UnitKind::ManifestColumn, content.into())
            .with_meta("unique_id", unique_id)
            .with_meta("column_name", meta.column_name)
            .with_meta("parent_resource_type", meta.parent_resource_type)
            .with_meta("parent_name", meta.parent_name);

        match meta.data_type {
            Some(data_type) => unit.with_meta("data_type", data_type),
            None => unit,
        }
    }

    /// Attach (or replace) a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Kind of this unit, read back from its metadata tag
    pub fn kind(&self) -> Option<UnitKind> {
        self.metadata_str(KIND_KEY).and_then(UnitKind::from_tag)
    }

    /// Manifest unique id, for manifest units
    pub fn unique_id(&self) -> Option<&str> {
        self.metadata_str("unique_id")
    }

    /// String metadata value for a key
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }

    /// List metadata value for a key
    pub fn metadata_list(&self, key: &str) -> Option<&[String]> {
        self.metadata.get(key).and_then(MetadataValue::as_list)
    }
}
