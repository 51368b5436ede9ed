//! Load results
//!
//! [`ScanOutcome`] is what each phase returns; [`LoadReport`] is the
//! concatenation of all phases plus summary counts.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};
use crate::unit::{TextUnit, UnitKind};

/// Units and diagnostics collected by a single scan phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    /// Successfully produced units, in production order
    pub units: Vec<TextUnit>,

    /// Everything that was skipped or noteworthy
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome holding a single diagnostic and no units
    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            units: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    pub fn push_unit(&mut self, unit: TextUnit) {
        self.units.push(unit);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append another outcome, keeping order
    pub fn extend(&mut self, other: ScanOutcome) {
        self.units.extend(other.units);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Number of diagnostics at warn level or above
    pub fn failure_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= Severity::Warn)
            .count()
    }
}

/// Summary statistics for a load pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Total number of units
    pub total_units: usize,

    pub sql_models: usize,
    pub schema_files: usize,
    pub manifest_resources: usize,
    pub manifest_columns: usize,

    /// Files or entries that were skipped (warn diagnostics)
    pub skipped: usize,

    /// Informational diagnostics, e.g. inputs that do not exist yet
    pub info: usize,
}

impl LoadSummary {
    /// Count units per kind and diagnostics per severity
    pub fn from_units(units: &[TextUnit], diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self {
            total_units: units.len(),
            ..Self::default()
        };

        for unit in units {
            match unit.kind() {
                Some(UnitKind::SqlModel) => summary.sql_models += 1,
                Some(UnitKind::Schema) => summary.schema_files += 1,
                Some(UnitKind::ManifestResource) => summary.manifest_resources += 1,
                Some(UnitKind::ManifestColumn) => summary.manifest_columns += 1,
                None => {}
            }
        }

        for diagnostic in diagnostics {
            if diagnostic.severity >= Severity::Warn {
                summary.skipped += 1;
            } else {
                summary.info += 1;
            }
        }

        summary
    }
}

/// Result of one full load (SQL scan, YAML scan, manifest synthesis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Timestamp (RFC 3339)
    pub generated_at: String,

    /// Summary statistics
    pub summary: LoadSummary,

    /// All units, in phase order
    pub units: Vec<TextUnit>,

    /// All diagnostics, in phase order
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    /// Build a report from a combined outcome
    pub fn from_outcome(outcome: ScanOutcome) -> Self {
        let summary = LoadSummary::from_units(&outcome.units, &outcome.diagnostics);

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary,
            units: outcome.units,
            diagnostics: outcome.diagnostics,
        }
    }

    /// Number of files or entries that were skipped
    pub fn skipped(&self) -> usize {
        self.summary.skipped
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
