//! YAML schema file scanning and rendering
//!
//! dbt schema files declare `models:` and `sources:` with names,
//! descriptions and columns. Each file is rendered to a short plain-text
//! summary rather than indexed as raw YAML.

use chatdbt_core::{Diagnostic, DiagnosticCode, ExclusionRules, ScanOutcome, SourceRenderMode, TextUnit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::path::Path;
use crate::walk::{has_extension, walk};

/// Accept strings, numbers and booleans as text (`name: 2024` is legal YAML)
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Accept only sequences; any other shape is treated as absent
fn lenient_sequence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Sequence(items) => Some(items),
        Value::Null => None,
        other => {
            tracing::debug!("Ignoring {} where a list was expected", value_kind(&other));
            None
        }
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Top level of a schema file
///
/// Collections stay untyped until rendering so one odd entry does not
/// discard the rest of the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub models: Option<Vec<Value>>,

    #[serde(default)]
    pub sources: Option<Vec<Value>>,
}

impl SchemaFile {
    /// Parse a YAML document; non-mapping documents have no collections
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(yaml)?;
        match value {
            Value::Mapping(_) => serde_yaml::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    /// Model entries that are mappings of the expected shape
    pub fn models(&self) -> Vec<YamlModel> {
        typed_entries(self.models.as_deref())
    }

    /// Source entries that are mappings of the expected shape
    pub fn sources(&self) -> Vec<YamlSource> {
        typed_entries(self.sources.as_deref())
    }
}

fn typed_entries<T: DeserializeOwned>(values: Option<&[Value]>) -> Vec<T> {
    values
        .unwrap_or_default()
        .iter()
        .filter(|value| value.is_mapping())
        .filter_map(|value| match serde_yaml::from_value(value.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping schema entry: {}", e);
                None
            }
        })
        .collect()
}

/// A `models:` entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct YamlModel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_sequence")]
    pub columns: Option<Vec<Value>>,
}

impl YamlModel {
    pub fn columns(&self) -> Vec<YamlColumn> {
        typed_entries(self.columns.as_deref())
    }
}

/// A column of a model entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct YamlColumn {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// A `sources:` entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct YamlSource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub database: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub schema: Option<String>,

    #[serde(default, deserialize_with = "lenient_sequence")]
    pub tables: Option<Vec<Value>>,
}

impl YamlSource {
    pub fn tables(&self) -> Vec<YamlTable> {
        typed_entries(self.tables.as_deref())
    }

    /// `database.schema.table` for one of this source's tables
    ///
    /// Table-level settings win; dbt defaults the schema to the source name.
    /// Parts that are not known are left out.
    pub fn relation(&self, table: &YamlTable) -> String {
        let database = table.database.as_ref().or(self.database.as_ref());
        let schema = table
            .schema
            .as_ref()
            .or(self.schema.as_ref())
            .or(self.name.as_ref());
        let identifier = table.identifier.as_ref().or(table.name.as_ref());

        [database, schema, identifier]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A table of a source entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct YamlTable {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub identifier: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub database: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub schema: Option<String>,
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(placeholder)
}

/// Render a schema file as readable text
pub fn render_schema(schema: &SchemaFile, file_name: &str, mode: SourceRenderMode) -> String {
    let mut text = String::new();
    text.push_str(&format!("Schema file: {}\n", file_name));

    if schema.models.is_some() {
        text.push_str("\nModels:\n");
        for model in schema.models() {
            text.push_str(&format!("- Model: {}\n", or_placeholder(&model.name, "Unknown")));
            text.push_str(&format!(
                "  Description: {}\n",
                or_placeholder(&model.description, "No description")
            ));

            let columns = model.columns();
            if !columns.is_empty() {
                text.push_str("  Columns:\n");
                for column in columns {
                    text.push_str(&format!(
                        "    - {}: {}\n",
                        or_placeholder(&column.name, "unknown"),
                        or_placeholder(&column.description, "No description")
                    ));
                }
            }
        }
    }

    if schema.sources.is_some() {
        text.push_str("\nSources:\n");
        for source in schema.sources() {
            text.push_str(&format!("- Source: {}\n", or_placeholder(&source.name, "Unknown")));

            match mode {
                SourceRenderMode::Description => {
                    text.push_str(&format!(
                        "  Description: {}\n",
                        or_placeholder(&source.description, "No description")
                    ));
                }
                SourceRenderMode::Relation => {
                    let tables = source.tables();
                    if !tables.is_empty() {
                        text.push_str("  Tables:\n");
                        for table in &tables {
                            text.push_str(&format!(
                                "    - {}: {}\n",
                                or_placeholder(&table.name, "unknown"),
                                source.relation(table)
                            ));
                        }
                    }
                }
            }
        }
    }

    text.trim_end().to_string()
}

/// One unit per `.yml` / `.yaml` file under the project root
///
/// Directories whose names match the extension are skipped, as are excluded
/// subtrees. Read and parse failures are logged, recorded and skipped.
pub fn scan_yaml(root: &Path, rules: &ExclusionRules, mode: SourceRenderMode) -> ScanOutcome {
    if !root.is_dir() {
        tracing::info!("Project root {} not found, skipping YAML scan", root.display());
        return ScanOutcome::from_diagnostic(
            Diagnostic::info(DiagnosticCode::RootMissing, "project root does not exist")
                .with_path(root.display().to_string()),
        );
    }

    let mut outcome = ScanOutcome::new();

    for entry in walk(root, rules) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error walking {}: {}", root.display(), e);
                let path = e.path().unwrap_or(root).display().to_string();
                outcome.push_diagnostic(Diagnostic::warn(DiagnosticCode::YamlReadError, e.to_string()).with_path(path));
                continue;
            }
        };

        let path = entry.path();
        if !has_extension(path, &["yml", "yaml"]) {
            continue;
        }
        if !entry.file_type().is_file() {
            tracing::debug!("Skipping directory: {}", path.display());
            continue;
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Error loading YAML file {}: {}", path.display(), e);
                outcome.push_diagnostic(
                    Diagnostic::warn(DiagnosticCode::YamlReadError, e.to_string())
                        .with_path(path.display().to_string()),
                );
                continue;
            }
        };

        let schema = match SchemaFile::parse(&contents) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!("Error parsing YAML file {}: {}", path.display(), e);
                outcome.push_diagnostic(
                    Diagnostic::warn(DiagnosticCode::YamlParseError, e.to_string())
                        .with_path(path.display().to_string()),
                );
                continue;
            }
        };

        let file_name = entry.file_name().to_string_lossy();
        let text = render_schema(&schema, &file_name, mode);
        outcome.push_unit(TextUnit::schema(text, path.display().to_string()));
    }

    tracing::info!("Loaded {} YAML files from {}", outcome.units.len(), root.display());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
version: 2

models:
  - name: orders
    description: One row per order.
    columns:
      - name: order_id
        description: Primary key
      - name: status
  - "not a mapping"
  - name: customers

sources:
  - name: raw
    description: Raw Stripe export
    database: analytics
    tables:
      - name: payments
      - name: refunds
        identifier: stripe_refunds
        schema: stripe
"#;

    #[test]
    fn renders_models_and_sources() {
        let schema = SchemaFile::parse(SCHEMA).unwrap();
        let text = render_schema(&schema, "schema.yml", SourceRenderMode::Description);

        let expected = "\
Schema file: schema.yml

Models:
- Model: orders
  Description: One row per order.
  Columns:
    - order_id: Primary key
    - status: No description
- Model: customers
  Description: No description

Sources:
- Source: raw
  Description: Raw Stripe export";
        assert_eq!(text, expected);
    }

    #[test]
    fn relation_mode_lists_qualified_tables() {
        let schema = SchemaFile::parse(SCHEMA).unwrap();
        let text = render_schema(&schema, "schema.yml", SourceRenderMode::Relation);

        assert!(text.ends_with(
            "- Source: raw\n  Tables:\n    - payments: analytics.raw.payments\n    - refunds: analytics.stripe.stripe_refunds"
        ));
        assert!(!text.contains("Raw Stripe export"));
    }

    #[test]
    fn files_without_collections_render_header_only() {
        let project = SchemaFile::parse("name: shop\nversion: '1.0'\n").unwrap();
        assert_eq!(render_schema(&project, "dbt_project.yml", SourceRenderMode::Description), "Schema file: dbt_project.yml");

        let list = SchemaFile::parse("- a\n- b\n").unwrap();
        assert_eq!(list, SchemaFile::default());

        let empty = SchemaFile::parse("").unwrap();
        assert_eq!(empty, SchemaFile::default());
    }

    #[test]
    fn model_with_mapping_columns_still_renders() {
        let schema = SchemaFile::parse(
            "models:\n  - name: orders\n    columns:\n      order_id:\n        description: Key\n  - name: customers\n",
        )
        .unwrap();
        let text = render_schema(&schema, "schema.yml", SourceRenderMode::Description);

        assert_eq!(
            text,
            "Schema file: schema.yml\n\nModels:\n- Model: orders\n  Description: No description\n- Model: customers\n  Description: No description"
        );
    }

    #[test]
    fn source_with_mapping_tables_still_renders() {
        let schema = SchemaFile::parse("sources:\n  - name: raw\n    tables:\n      payments: {}\n").unwrap();
        let text = render_schema(&schema, "sources.yml", SourceRenderMode::Relation);

        assert_eq!(text, "Schema file: sources.yml\n\nSources:\n- Source: raw");
    }

    #[test]
    fn numeric_names_are_text() {
        let schema = SchemaFile::parse("models:\n  - name: 2024\n    description: true\n").unwrap();
        let models = schema.models();
        assert_eq!(models[0].name.as_deref(), Some("2024"));
        assert_eq!(models[0].description.as_deref(), Some("true"));
    }

    #[test]
    fn scan_skips_directories_named_like_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models").join("weird.yml")).unwrap();
        std::fs::write(dir.path().join("models").join("schema.yaml"), SCHEMA).unwrap();

        let rules = ExclusionRules::default();
        let first = scan_yaml(dir.path(), &rules, SourceRenderMode::Description);
        let second = scan_yaml(dir.path(), &rules, SourceRenderMode::Description);

        assert_eq!(first.units.len(), 1);
        assert!(first.diagnostics.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn parse_errors_skip_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yml"), "models: [unclosed\n").unwrap();
        std::fs::write(dir.path().join("good.yml"), SCHEMA).unwrap();
        std::fs::create_dir_all(dir.path().join("dbt_packages").join("elementary")).unwrap();
        std::fs::write(dir.path().join("dbt_packages").join("elementary").join("schema.yml"), SCHEMA).unwrap();

        let outcome = scan_yaml(dir.path(), &ExclusionRules::default(), SourceRenderMode::Description);

        assert_eq!(outcome.units.len(), 1);
        assert!(outcome.units[0].metadata_str("file_path").unwrap().ends_with("good.yml"));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::YamlParseError);
    }
}
