//! Load diagnostics
//!
//! Scanners never abort on a bad file. Each failure is recorded here
//! instead and the batch carries on.
//! Codes are stable strings: add new ones, never rename.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A compiled SQL file could not be read
    SqlReadError,

    /// A YAML file could not be read
    YamlReadError,

    /// A YAML file is not valid YAML
    YamlParseError,

    /// The manifest exists but could not be read
    ManifestReadError,

    /// The manifest is not a JSON object with the expected sections
    ManifestParseError,

    /// A single manifest entry had an unexpected shape and was skipped
    ManifestEntryError,

    /// A configured scan root does not exist
    RootMissing,

    /// No manifest yet (project not compiled)
    ManifestMissing,

    /// Nothing at all was produced
    EmptyCorpus,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlReadError => "SQL_READ_ERROR",
            Self::YamlReadError => "YAML_READ_ERROR",
            Self::YamlParseError => "YAML_PARSE_ERROR",
            Self::ManifestReadError => "MANIFEST_READ_ERROR",
            Self::ManifestParseError => "MANIFEST_PARSE_ERROR",
            Self::ManifestEntryError => "MANIFEST_ENTRY_ERROR",
            Self::RootMissing => "ROOT_MISSING",
            Self::ManifestMissing => "MANIFEST_MISSING",
            Self::EmptyCorpus => "EMPTY_CORPUS",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected condition, e.g. an input that does not exist yet
    Info,

    /// A file or entry was skipped
    Warn,

    /// The load as a whole is unusable
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A recorded failure or notable condition from a load pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// File or manifest id the diagnostic is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            path: None,
        }
    }

    /// Shorthand for a skipped file or entry
    pub fn warn(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warn, message)
    }

    /// Shorthand for a condition that makes the whole load unusable
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Shorthand for an informational note
    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.code, path, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
