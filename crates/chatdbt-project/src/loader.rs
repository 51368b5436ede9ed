//! Full project load: SQL scan, YAML scan, manifest synthesis

use chatdbt_core::{Config, Diagnostic, DiagnosticCode, LoadReport, ScanOutcome, TextUnit};
use chatdbt_dbt::ManifestSynthesizer;
use std::path::PathBuf;
use crate::sql::scan_sql;
use crate::yaml::scan_yaml;

/// Runs every phase against one configured project
#[derive(Debug, Clone)]
pub struct ProjectLoader {
    config: Config,
    synthesizer: ManifestSynthesizer,
}

impl ProjectLoader {
    pub fn new(config: Config) -> Self {
        let synthesizer = ManifestSynthesizer::new(config.exclusions.clone());
        Self { config, synthesizer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiled SQL phase
    pub fn scan_sql(&self) -> ScanOutcome {
        scan_sql(&self.config.resolved_compiled_root(), &self.config.exclusions)
    }

    /// YAML schema phase
    pub fn scan_yaml(&self) -> ScanOutcome {
        scan_yaml(
            &self.config.resolved_project_root(),
            &self.config.exclusions,
            self.config.rendering.source_mode,
        )
    }

    /// Manifest phase
    pub fn synthesize_manifest(&self) -> ScanOutcome {
        self.synthesizer.synthesize_file(&self.config.resolved_manifest_path())
    }

    /// Run all phases and concatenate their output in phase order
    ///
    /// Every phase tolerates missing inputs and bad files; the load only
    /// fails when nothing at all could be turned into a unit.
    pub fn load(&self) -> Result<LoadReport, LoadError> {
        let project_root = self.config.resolved_project_root();
        tracing::info!("Loading dbt project from {}", project_root.display());

        let mut outcome = self.scan_sql();
        outcome.extend(self.scan_yaml());
        outcome.extend(self.synthesize_manifest());

        if outcome.units.is_empty() {
            tracing::warn!("No documents loaded from {}", project_root.display());
            outcome.push_diagnostic(
                Diagnostic::error(
                    DiagnosticCode::EmptyCorpus,
                    "No SQL, YAML or manifest units were produced",
                )
                .with_path(project_root.display().to_string()),
            );
            return Err(LoadError::EmptyCorpus {
                project_root,
                diagnostics: outcome.diagnostics,
            });
        }

        let report = LoadReport::from_outcome(outcome);
        tracing::info!(
            "Loaded {} units ({} skipped)",
            report.summary.total_units,
            report.skipped()
        );

        Ok(report)
    }

    /// Units only, for callers that do not care about diagnostics
    pub fn load_documents(&self) -> Result<Vec<TextUnit>, LoadError> {
        self.load().map(|report| report.units)
    }
}

/// Load error types
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No documents loaded from {}; check the project path and run `dbt compile`", project_root.display())]
    EmptyCorpus {
        project_root: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdbt_core::Severity;

    #[test]
    fn empty_project_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ProjectLoader::new(Config::for_project(dir.path()));

        let err = loader.load().unwrap_err();
        let LoadError::EmptyCorpus { project_root, diagnostics } = err;

        assert_eq!(project_root, dir.path());
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::RootMissing,
                DiagnosticCode::ManifestMissing,
                DiagnosticCode::EmptyCorpus,
            ]
        );
        let last = diagnostics.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.path.as_deref(), Some(dir.path().to_string_lossy().as_ref()));
    }

    #[test]
    fn phases_resolve_paths_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let compiled = dir.path().join("target").join("compiled").join("shop");
        std::fs::create_dir_all(&compiled).unwrap();
        std::fs::write(compiled.join("orders.sql"), "select 1").unwrap();

        let loader = ProjectLoader::new(Config::for_project(dir.path()));

        assert_eq!(loader.scan_sql().units.len(), 1);
        // target/ is inside the project root but holds no YAML
        assert!(loader.scan_yaml().units.is_empty());
        assert_eq!(loader.load_documents().unwrap().len(), 1);
    }
}
