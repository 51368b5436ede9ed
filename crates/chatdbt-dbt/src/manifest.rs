//! dbt manifest.json parsing
//!
//! Only the fields the synthesizer reads are modelled. Every field is
//! optional with an explicit default, and JSON `null` is treated the same
//! as a missing key.
//!
//! Parsing happens in two steps: the top level is read as maps of raw JSON
//! values, then each entry is deserialized on its own. An entry with an
//! unexpected shape is recorded in [`Manifest::rejected`] instead of failing
//! the whole manifest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Deserialize `null` as the type's default
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    /// Metadata about the manifest, when present and well-formed
    pub metadata: Option<ManifestMetadata>,

    /// Models, seeds, snapshots, tests, ... keyed by unique_id
    pub nodes: BTreeMap<String, ManifestNode>,

    /// Source tables keyed by unique_id
    pub sources: BTreeMap<String, ManifestSource>,

    /// Macros keyed by unique_id
    pub macros: BTreeMap<String, ManifestMacro>,

    /// Entries that could not be deserialized
    #[serde(skip)]
    pub rejected: Vec<RejectedEntry>,
}

/// Top level of the document, entries still untyped
#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    metadata: Option<Value>,

    #[serde(default, deserialize_with = "null_default")]
    nodes: BTreeMap<String, Value>,

    #[serde(default, deserialize_with = "null_default")]
    sources: BTreeMap<String, Value>,

    #[serde(default, deserialize_with = "null_default")]
    macros: BTreeMap<String, Value>,
}

/// A manifest entry that was skipped during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Top-level section (`nodes`, `sources` or `macros`)
    pub section: &'static str,

    /// Map key of the entry
    pub unique_id: String,

    /// Deserialization error
    pub reason: String,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))?;

        let mut rejected = Vec::new();

        let mut nodes: BTreeMap<String, ManifestNode> = parse_section("nodes", raw.nodes, &mut rejected);
        for (id, node) in nodes.iter_mut() {
            node.normalize(id);
        }

        let mut sources: BTreeMap<String, ManifestSource> = parse_section("sources", raw.sources, &mut rejected);
        for (id, source) in sources.iter_mut() {
            source.normalize(id);
        }

        let mut macros: BTreeMap<String, ManifestMacro> = parse_section("macros", raw.macros, &mut rejected);
        for (id, macro_def) in macros.iter_mut() {
            if macro_def.unique_id.is_empty() {
                macro_def.unique_id = id.clone();
            }
        }

        let metadata = raw
            .metadata
            .and_then(|value| serde_json::from_value(value).ok());

        Ok(Self {
            metadata,
            nodes,
            sources,
            macros,
            rejected,
        })
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }

    /// Get a specific source by unique_id
    pub fn get_source(&self, unique_id: &str) -> Option<&ManifestSource> {
        self.sources.get(unique_id)
    }

    /// Get a specific macro by unique_id
    pub fn get_macro(&self, unique_id: &str) -> Option<&ManifestMacro> {
        self.macros.get(unique_id)
    }
}

fn parse_section<T: DeserializeOwned>(
    section: &'static str,
    raw: BTreeMap<String, Value>,
    rejected: &mut Vec<RejectedEntry>,
) -> BTreeMap<String, T> {
    let mut parsed = BTreeMap::new();

    for (unique_id, value) in raw {
        match serde_json::from_value::<T>(value) {
            Ok(entry) => {
                parsed.insert(unique_id, entry);
            }
            Err(e) => rejected.push(RejectedEntry {
                section,
                unique_id,
                reason: e.to_string(),
            }),
        }
    }

    parsed
}

/// Last `.`-separated segment of an id (`model.shop.orders` -> `orders`)
pub fn trailing_segment(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

/// Manifest metadata, used to label the synthesis log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub dbt_version: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// A node in the manifest (model, test, seed, snapshot, etc.)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.shop.orders"); the map key if absent
    #[serde(default, deserialize_with = "null_default")]
    pub unique_id: String,

    /// Node name (e.g., "orders")
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    /// Alias (output relation name)
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    /// Resource type (model, seed, snapshot, ...); taken from the id if absent
    #[serde(default, deserialize_with = "null_default")]
    pub resource_type: String,

    /// Compiled SQL body
    #[serde(default)]
    pub compiled_code: Option<String>,

    /// Pre-1.3 manifests call the compiled body `compiled_sql`
    #[serde(default, skip_serializing)]
    pub compiled_sql: Option<String>,

    /// Path of the defining file, relative to the project root
    #[serde(default, deserialize_with = "null_default")]
    pub original_file_path: String,

    /// Column definitions keyed by column name
    #[serde(default, deserialize_with = "null_default")]
    pub columns: BTreeMap<String, ColumnDefinition>,

    /// Dependencies
    #[serde(default, deserialize_with = "null_default")]
    pub depends_on: DependsOn,
}

impl ManifestNode {
    fn normalize(&mut self, key: &str) {
        if self.unique_id.is_empty() {
            self.unique_id = key.to_string();
        }
        if self.resource_type.is_empty() {
            if let Some((prefix, _)) = self.unique_id.split_once('.') {
                self.resource_type = prefix.to_string();
            }
        }
        normalize_columns(&mut self.columns);
    }

    /// Name, or the trailing id segment for nameless nodes
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            trailing_segment(&self.unique_id)
        } else {
            &self.name
        }
    }

    /// Alias, defaulting to the name
    pub fn alias_or_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => self.display_name(),
        }
    }

    /// Compiled SQL, if the node has been compiled and it is not blank
    pub fn compiled_body(&self) -> Option<&str> {
        self.compiled_code
            .as_deref()
            .or(self.compiled_sql.as_deref())
            .filter(|sql| !sql.trim().is_empty())
    }
}

/// A source in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSource {
    /// Unique identifier (e.g., "source.shop.raw.orders"); the map key if absent
    #[serde(default, deserialize_with = "null_default")]
    pub unique_id: String,

    /// Table name within the source group (e.g., "orders")
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    /// Source group name (e.g., "raw")
    #[serde(default, deserialize_with = "null_default")]
    pub source_name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    /// Fully qualified relation (e.g., `"analytics"."raw"."orders"`)
    #[serde(default)]
    pub relation_name: Option<String>,

    /// Actual table name when it differs from `name`
    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub original_file_path: String,

    #[serde(default = "default_source_type", deserialize_with = "source_type")]
    pub resource_type: String,

    /// Column definitions keyed by column name
    #[serde(default, deserialize_with = "null_default")]
    pub columns: BTreeMap<String, ColumnDefinition>,
}

fn default_source_type() -> String {
    "source".to_string()
}

fn source_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|t| !t.is_empty())
        .unwrap_or_else(default_source_type))
}

impl Default for ManifestSource {
    fn default() -> Self {
        Self {
            unique_id: String::new(),
            name: String::new(),
            source_name: String::new(),
            description: String::new(),
            relation_name: None,
            identifier: None,
            original_file_path: String::new(),
            resource_type: default_source_type(),
            columns: BTreeMap::new(),
        }
    }
}

impl ManifestSource {
    fn normalize(&mut self, key: &str) {
        if self.unique_id.is_empty() {
            self.unique_id = key.to_string();
        }
        normalize_columns(&mut self.columns);
    }

    /// Table name, or the trailing id segment for nameless sources
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            trailing_segment(&self.unique_id)
        } else {
            &self.name
        }
    }

    /// `source_name.name`, as sources are written in `source()` calls
    pub fn qualified_name(&self) -> String {
        if self.source_name.is_empty() {
            self.display_name().to_string()
        } else {
            format!("{}.{}", self.source_name, self.display_name())
        }
    }

    /// Physical table name: last segment of the relation name, unquoted
    pub fn table_name(&self) -> String {
        let from_relation = self
            .relation_name
            .as_deref()
            .map(|relation| trailing_segment(relation).trim_matches(|c| c == '"' || c == '`').to_string())
            .filter(|table| !table.is_empty());

        from_relation
            .or_else(|| self.identifier.clone().filter(|id| !id.is_empty()))
            .unwrap_or_else(|| self.display_name().to_string())
    }
}

/// Macro definition (only the name is needed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMacro {
    #[serde(default, deserialize_with = "null_default")]
    pub unique_id: String,

    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

/// Column definition from manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name; the map key if absent
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    /// Data type (if declared)
    #[serde(default)]
    pub data_type: Option<String>,
}

impl ColumnDefinition {
    /// Description, or a placeholder when none was written
    pub fn description_or_default(&self) -> &str {
        if self.description.trim().is_empty() {
            "No description provided."
        } else {
            &self.description
        }
    }

    /// Declared data type, ignoring blanks
    pub fn declared_type(&self) -> Option<&str> {
        self.data_type.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Declared data type, or a placeholder
    pub fn data_type_or_default(&self) -> &str {
        self.declared_type().unwrap_or("unknown type")
    }
}

fn normalize_columns(columns: &mut BTreeMap<String, ColumnDefinition>) {
    for (key, column) in columns.iter_mut() {
        if column.name.is_empty() {
            column.name = key.clone();
        }
    }
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// Node and source unique_ids this node depends on
    #[serde(default, deserialize_with = "null_default")]
    pub nodes: Vec<String>,

    /// Macro unique_ids this node calls
    #[serde(default, deserialize_with = "null_default")]
    pub macros: Vec<String>,
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
