//! Configuration schema (chatdbt.toml)

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable overriding the project root
pub const ENV_PROJECT_PATH: &str = "DBT_PROJECT_PATH";

/// Environment variable overriding the compiled SQL root
pub const ENV_DOCS_PATH: &str = "DBT_DOCS_PATH";

/// Environment variable overriding the manifest location
pub const ENV_MANIFEST_PATH: &str = "DBT_MANIFEST_PATH";

/// How source declarations in YAML schema files are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRenderMode {
    /// Source name and description
    Description,

    /// Source name and database.schema.table per declared table
    Relation,
}

impl Default for SourceRenderMode {
    fn default() -> Self {
        Self::Description
    }
}

/// Rendering options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderingConfig {
    #[serde(default)]
    pub source_mode: SourceRenderMode,
}

/// Which files and manifest entries never become text units
///
/// The defaults match a project that installs the `elementary`
/// observability package; other projects will want their own markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    /// Directory names whose whole subtree is skipped by the file scanners
    #[serde(default = "default_directory_markers")]
    pub directory_markers: Vec<String>,

    /// Substrings that exclude a manifest node id
    #[serde(default = "default_node_id_markers")]
    pub node_id_markers: Vec<String>,

    /// Prefixes that exclude a manifest node id (dbt's generated tests)
    #[serde(default = "default_node_id_prefixes")]
    pub node_id_prefixes: Vec<String>,
}

fn default_directory_markers() -> Vec<String> {
    vec!["elementary".to_string()]
}

fn default_node_id_markers() -> Vec<String> {
    vec!["elementary".to_string()]
}

fn default_node_id_prefixes() -> Vec<String> {
    vec!["test.".to_string()]
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            directory_markers: default_directory_markers(),
            node_id_markers: default_node_id_markers(),
            node_id_prefixes: default_node_id_prefixes(),
        }
    }
}

impl ExclusionRules {
    /// Check if a directory name is one of the markers
    pub fn is_excluded_dir(&self, name: &OsStr) -> bool {
        self.directory_markers
            .iter()
            .any(|marker| name.to_str() == Some(marker.as_str()))
    }

    /// Check if a manifest node id should be skipped
    pub fn is_excluded_node(&self, unique_id: &str) -> bool {
        self.node_id_markers.iter().any(|marker| unique_id.contains(marker.as_str()))
            || self.node_id_prefixes.iter().any(|prefix| unique_id.starts_with(prefix.as_str()))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// dbt project root (YAML scan)
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Compiled SQL root, relative to the project root unless absolute
    #[serde(default = "default_compiled_root")]
    pub compiled_root: PathBuf,

    /// Manifest location, relative to the project root unless absolute
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Exclusion rules
    #[serde(default)]
    pub exclusions: ExclusionRules,

    /// Rendering options
    #[serde(default)]
    pub rendering: RenderingConfig,

    /// Directory relative paths above are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_compiled_root() -> PathBuf {
    PathBuf::from("target").join("compiled")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("target").join("manifest.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            compiled_root: default_compiled_root(),
            manifest_path: default_manifest_path(),
            exclusions: ExclusionRules::default(),
            rendering: RenderingConfig::default(),
            base_dir: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Config rooted at a dbt project directory, everything else default
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Relative paths in the file are relative to the file itself
        if let Some(parent) = path.parent() {
            config.base_dir = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.base_dir = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Override paths from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override paths from an arbitrary lookup (empty values are ignored)
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(project) = get(ENV_PROJECT_PATH) {
            self.project_root = PathBuf::from(project);
        }
        if let Some(compiled) = get(ENV_DOCS_PATH) {
            self.compiled_root = PathBuf::from(compiled);
        }
        if let Some(manifest) = get(ENV_MANIFEST_PATH) {
            self.manifest_path = PathBuf::from(manifest);
        }
    }

    /// Absolute (or base-relative) project root
    pub fn resolved_project_root(&self) -> PathBuf {
        self.base_dir.join(&self.project_root)
    }

    /// Compiled SQL root
    pub fn resolved_compiled_root(&self) -> PathBuf {
        self.resolved_project_root().join(&self.compiled_root)
    }

    /// Manifest file
    pub fn resolved_manifest_path(&self) -> PathBuf {
        self.resolved_project_root().join(&self.manifest_path)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
