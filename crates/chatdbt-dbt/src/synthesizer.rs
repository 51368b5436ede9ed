//! Manifest -> text units
//!
//! Each node and source becomes one self-contained narrative unit, followed
//! by one unit per declared column. Lookups are resolved up front so every
//! unit reads on its own without the manifest at hand.

use chatdbt_core::{
    ColumnMeta, Diagnostic, DiagnosticCode, ExclusionRules, ResourceMeta, ScanOutcome, TextUnit,
};
use std::path::Path;
use crate::lookup::{resolve_dependencies, LookupTables};
use crate::manifest::{ColumnDefinition, Manifest, ManifestError, ManifestNode, ManifestSource, RejectedEntry};
use crate::test_detection::TestDetector;

/// Turns a parsed manifest into resource and column units
#[derive(Debug, Clone)]
pub struct ManifestSynthesizer {
    rules: ExclusionRules,
    detector: TestDetector,
}

impl ManifestSynthesizer {
    pub fn new(rules: ExclusionRules) -> Self {
        Self {
            rules,
            detector: TestDetector::new(),
        }
    }

    /// Load and synthesize a manifest file
    ///
    /// A missing file is not an error (the project may not be compiled yet)
    /// and yields no units. A file that cannot be read or parsed is logged
    /// and also yields no units.
    pub fn synthesize_file(&self, path: &Path) -> ScanOutcome {
        if !path.exists() {
            tracing::info!("No manifest at {}, skipping manifest synthesis", path.display());
            return ScanOutcome::from_diagnostic(
                Diagnostic::info(DiagnosticCode::ManifestMissing, "manifest not found; run `dbt compile` to generate it")
                    .with_path(path.display().to_string()),
            );
        }

        match Manifest::from_file(path) {
            Ok(manifest) => self.synthesize(&manifest),
            Err(e) => {
                tracing::warn!("Skipping manifest {}: {}", path.display(), e);
                let code = match &e {
                    ManifestError::IoError(..) => DiagnosticCode::ManifestReadError,
                    ManifestError::ParseError(_) => DiagnosticCode::ManifestParseError,
                };
                ScanOutcome::from_diagnostic(
                    Diagnostic::warn(code, e.to_string()).with_path(path.display().to_string()),
                )
            }
        }
    }

    /// Synthesize units for every node and source of a parsed manifest
    pub fn synthesize(&self, manifest: &Manifest) -> ScanOutcome {
        let tables = LookupTables::from_manifest(manifest);
        let mut outcome = ScanOutcome::new();

        if let Some(meta) = &manifest.metadata {
            tracing::info!(
                "Synthesizing manifest of project {} (dbt {})",
                meta.project_name.as_deref().unwrap_or("unknown"),
                meta.dbt_version.as_deref().unwrap_or("unknown")
            );
        }

        for entry in &manifest.rejected {
            outcome.push_diagnostic(rejected_diagnostic(entry));
        }

        let mut excluded = 0usize;
        for (unique_id, node) in &manifest.nodes {
            if self.rules.is_excluded_node(unique_id) {
                tracing::debug!("Excluding manifest node {}", unique_id);
                excluded += 1;
                continue;
            }

            for unit in self.node_units(node, manifest, &tables) {
                outcome.push_unit(unit);
            }
        }

        for source in manifest.sources.values() {
            for unit in source_units(source) {
                outcome.push_unit(unit);
            }
        }

        tracing::info!(
            "Synthesized {} units from manifest ({} nodes excluded, {} entries rejected)",
            outcome.units.len(),
            excluded,
            manifest.rejected.len()
        );

        outcome
    }

    /// Resource unit for a node, then one unit per column
    pub fn node_units(&self, node: &ManifestNode, manifest: &Manifest, tables: &LookupTables) -> Vec<TextUnit> {
        let deps = resolve_dependencies(node, manifest, tables);
        let tests = self.detector.infer_tests(node, tables);
        let name = node.display_name();

        let mut text = String::new();
        text.push_str(&format!("{}: {}\n", heading(&node.resource_type), name));
        text.push_str(&format!("Alias: {}\n", node.alias_or_name()));
        push_description(&mut text, &node.description);
        push_location(&mut text, &node.original_file_path);

        if !node.columns.is_empty() {
            text.push_str("\nColumns:\n");
            for column in node.columns.values() {
                text.push_str(&format!(
                    "- {} ({}): {}\n",
                    column.name,
                    column.data_type_or_default(),
                    column.description_or_default()
                ));
            }
        }

        if !deps.models.is_empty() || !deps.sources.is_empty() || !tests.is_empty() {
            text.push('\n');
        }
        if !deps.models.is_empty() {
            text.push_str(&format!("Depends on models: {}\n", deps.models.join(", ")));
        }
        if !deps.sources.is_empty() {
            text.push_str(&format!("Depends on sources: {}\n", deps.sources.join(", ")));
        }
        if !tests.is_empty() {
            text.push_str(&format!("Tests applied: {}\n", tests.join(", ")));
        }

        if let Some(sql) = node.compiled_body() {
            text.push_str(&format!("\nCompiled SQL:\n```sql\n{}\n```\n", sql.trim_end()));
        }

        let meta = ResourceMeta {
            unique_id: node.unique_id.clone(),
            resource_type: node.resource_type.clone(),
            name: name.to_string(),
            alias: node.alias_or_name().to_string(),
            file_path: node.original_file_path.clone(),
            depends_on_models: deps.models,
            depends_on_sources: deps.sources,
            tests,
        };

        let mut units = Vec::with_capacity(node.columns.len() + 1);
        units.push(TextUnit::manifest_resource(text.trim_end(), meta));

        for column in node.columns.values() {
            units.push(column_unit(
                column,
                &node.unique_id,
                &node.resource_type,
                name,
                true,
            ));
        }

        units
    }
}

/// Resource unit for a source, then one unit per column
///
/// Sources are never excluded; they are the project's own inputs.
pub fn source_units(source: &ManifestSource) -> Vec<TextUnit> {
    let table = source.table_name();
    let qualified = source.qualified_name();

    let mut text = String::new();
    text.push_str(&format!("{}: {}\n", heading(&source.resource_type), qualified));
    text.push_str(&format!("Table: {}\n", table));
    push_description(&mut text, &source.description);
    push_location(&mut text, &source.original_file_path);

    if !source.columns.is_empty() {
        text.push_str("\nColumns:\n");
        for column in source.columns.values() {
            text.push_str(&format!("- {}: {}\n", column.name, column.description_or_default()));
        }
    }

    let meta = ResourceMeta {
        unique_id: source.unique_id.clone(),
        resource_type: source.resource_type.clone(),
        name: qualified.clone(),
        alias: table,
        file_path: source.original_file_path.clone(),
        ..Default::default()
    };

    let mut units = Vec::with_capacity(source.columns.len() + 1);
    units.push(
        TextUnit::manifest_resource(text.trim_end(), meta)
            .with_meta("source_name", source.source_name.clone()),
    );

    for column in source.columns.values() {
        units.push(column_unit(
            column,
            &source.unique_id,
            &source.resource_type,
            &qualified,
            false,
        ));
    }

    units
}

fn column_unit(
    column: &ColumnDefinition,
    parent_id: &str,
    parent_type: &str,
    parent_name: &str,
    show_type: bool,
) -> TextUnit {
    let mut text = String::new();
    text.push_str(&format!("Column: {}\n", column.name));
    text.push_str(&format!("Belongs to {}: {}\n", parent_type, parent_name));
    if show_type {
        text.push_str(&format!("Data type: {}\n", column.data_type_or_default()));
    }
    text.push_str(&format!("Description: {}", column.description_or_default()));

    TextUnit::manifest_column(
        text,
        ColumnMeta {
            parent_unique_id: parent_id.to_string(),
            parent_resource_type: parent_type.to_string(),
            parent_name: parent_name.to_string(),
            column_name: column.name.clone(),
            data_type: column.declared_type().map(str::to_string),
        },
    )
}

fn push_description(text: &mut String, description: &str) {
    let description = description.trim();
    if !description.is_empty() {
        text.push_str(&format!("Description: {}\n", description));
    }
}

fn push_location(text: &mut String, file_path: &str) {
    if !file_path.is_empty() {
        text.push_str(&format!("Defined in: {}\n", file_path));
    }
}

/// `model` -> `Model`, `snapshot` -> `Snapshot`
fn heading(resource_type: &str) -> String {
    let mut chars = resource_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Resource".to_string(),
    }
}

fn rejected_diagnostic(entry: &RejectedEntry) -> Diagnostic {
    tracing::warn!(
        "Skipping manifest {} entry {}: {}",
        entry.section,
        entry.unique_id,
        entry.reason
    );
    Diagnostic::warn(
        DiagnosticCode::ManifestEntryError,
        format!("unexpected {} entry shape: {}", entry.section, entry.reason),
    )
    .with_path(entry.unique_id.clone())
}
