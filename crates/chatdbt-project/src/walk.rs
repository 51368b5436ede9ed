//! Directory walking shared by the scanners

use chatdbt_core::ExclusionRules;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Walk `root` in file-name order, pruning excluded directories
///
/// Yields directories as well as files; callers filter on file type.
/// Symlinks are followed, so linked model folders are scanned; a link
/// cycle comes back as an `Err` entry. The root itself is never pruned,
/// even if its name is a marker.
pub fn walk<'a>(
    root: &Path,
    rules: &'a ExclusionRules,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            let pruned = entry.depth() > 0
                && entry.file_type().is_dir()
                && rules.is_excluded_dir(entry.file_name());
            if pruned {
                tracing::debug!("Skipping excluded directory {}", entry.path().display());
            }
            !pruned
        })
}

/// Check a path's extension against a list, ignoring case
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
        .unwrap_or(false)
}

/// `path` relative to `root`, or `path` itself if it is not under `root`
pub fn relative_to<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}
