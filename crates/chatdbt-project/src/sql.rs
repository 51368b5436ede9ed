//! Compiled SQL scanning

use chatdbt_core::{Diagnostic, DiagnosticCode, ExclusionRules, ScanOutcome, TextUnit};
use std::path::{Component, Path};
use crate::walk::{has_extension, relative_to, walk};

/// Dotted model name from a path relative to the compiled root
///
/// `marts/finance/revenue.sql` -> `marts.finance.revenue`
pub fn model_name(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// One unit per `.sql` file under `root`
///
/// A missing root is not an error and yields nothing. Files under an
/// excluded directory are skipped; unreadable files are logged, recorded
/// and skipped.
pub fn scan_sql(root: &Path, rules: &ExclusionRules) -> ScanOutcome {
    if !root.is_dir() {
        tracing::info!("Compiled SQL root {} not found, skipping SQL scan", root.display());
        return ScanOutcome::from_diagnostic(
            Diagnostic::info(DiagnosticCode::RootMissing, "compiled SQL root does not exist")
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
                outcome.push_diagnostic(Diagnostic::warn(DiagnosticCode::SqlReadError, e.to_string()).with_path(path));
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), &["sql"]) {
            continue;
        }

        let path = entry.path();
        let name = model_name(relative_to(path, root));

        let sql = match std::fs::read_to_string(path) {
            Ok(sql) => sql,
            Err(e) => {
                tracing::warn!("Error loading SQL file {}: {}", path.display(), e);
                outcome.push_diagnostic(
                    Diagnostic::warn(DiagnosticCode::SqlReadError, e.to_string())
                        .with_path(path.display().to_string()),
                );
                continue;
            }
        };

        let content = if sql.trim().is_empty() {
            format!("Compiled SQL model {} is empty.", name)
        } else {
            sql
        };

        outcome.push_unit(TextUnit::sql_model(content, path.display().to_string(), name));
    }

    tracing::info!("Loaded {} compiled SQL models from {}", outcome.units.len(), root.display());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdbt_core::UnitKind;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn model_name_joins_segments() {
        assert_eq!(model_name(Path::new("marts/finance/revenue.sql")), "marts.finance.revenue");
        assert_eq!(model_name(Path::new("orders.sql")), "orders");
        assert_eq!(model_name(Path::new("staging/stg.orders.sql")), "staging.stg.orders");
    }

    #[test]
    fn scans_nested_sql_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shop/models/marts/finance/revenue.sql", b"select 1 as revenue");
        write(dir.path(), "shop/models/staging/stg_orders.sql", b"select 2");
        write(dir.path(), "shop/models/staging/notes.md", b"# not sql");

        let outcome = scan_sql(dir.path(), &ExclusionRules::default());

        let names: Vec<_> = outcome.units.iter().filter_map(|u| u.metadata_str("model_name")).collect();
        assert_eq!(
            names,
            vec!["shop.models.marts.finance.revenue", "shop.models.staging.stg_orders"]
        );
        assert!(outcome.units.iter().all(|u| u.kind() == Some(UnitKind::SqlModel)));
        assert_eq!(outcome.units[0].content, "select 1 as revenue");
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn excluded_subtrees_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shop/models/orders.sql", b"select 1");
        write(dir.path(), "elementary/models/edr/alerts.sql", b"select 2");

        let outcome = scan_sql(dir.path(), &ExclusionRules::default());
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].metadata_str("model_name"), Some("shop.models.orders"));
    }

    #[test]
    fn unreadable_file_does_not_abort_scan() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_bad.sql", &[0xff, 0xfe, 0x00, 0xc3]);
        write(dir.path(), "b_good.sql", b"select 1");

        let outcome = scan_sql(dir.path(), &ExclusionRules::default());
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].metadata_str("model_name"), Some("b_good"));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::SqlReadError);
    }

    #[test]
    fn empty_file_still_has_prose() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.sql", b"  \n");

        let outcome = scan_sql(dir.path(), &ExclusionRules::default());
        assert_eq!(outcome.units[0].content, "Compiled SQL model empty is empty.");
    }

    #[test]
    fn missing_root_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = scan_sql(&dir.path().join("target").join("compiled"), &ExclusionRules::default());

        assert!(outcome.units.is_empty());
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::RootMissing);
        assert_eq!(outcome.failure_count(), 0);
    }
}
