//! Id -> display name lookups
//!
//! Built once per synthesis pass, before any node is processed, and passed
//! by reference into the per-node routines.

use std::collections::{HashMap, HashSet};
use crate::manifest::{Manifest, ManifestNode};

/// Prefix of source unique ids
const SOURCE_PREFIX: &str = "source.";

/// Display names for sources and macros, keyed by unique_id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTables {
    /// source id -> `source_name.table`
    sources: HashMap<String, String>,

    /// macro id -> macro name
    macros: HashMap<String, String>,
}

impl LookupTables {
    /// Build both tables from a manifest
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let sources = manifest
            .sources
            .iter()
            .map(|(id, source)| (id.clone(), source.qualified_name()))
            .collect();

        let macros = manifest
            .macros
            .iter()
            .filter(|(_, macro_def)| !macro_def.name.is_empty())
            .map(|(id, macro_def)| (id.clone(), macro_def.name.clone()))
            .collect();

        Self { sources, macros }
    }

    /// Display name of a source id
    pub fn source_name(&self, unique_id: &str) -> Option<&str> {
        self.sources.get(unique_id).map(String::as_str)
    }

    /// Name of a macro id
    pub fn macro_name(&self, unique_id: &str) -> Option<&str> {
        self.macros.get(unique_id).map(String::as_str)
    }
}

/// A node's direct dependencies, as display names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependencies {
    /// Models, seeds, snapshots, ... the node selects from
    pub models: Vec<String>,

    /// Sources the node selects from
    pub sources: Vec<String>,
}

/// Resolve `depends_on.nodes` to names
///
/// Unknown ids are kept verbatim so no dependency is ever lost.
/// Order follows the manifest. Repeated ids are dropped; distinct ids that
/// share a name (versions, other packages) each keep their entry.
pub fn resolve_dependencies(
    node: &ManifestNode,
    manifest: &Manifest,
    tables: &LookupTables,
) -> ResolvedDependencies {
    let mut resolved = ResolvedDependencies::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for dep_id in &node.depends_on.nodes {
        if !seen.insert(dep_id.as_str()) {
            continue;
        }

        if dep_id.starts_with(SOURCE_PREFIX) {
            let name = tables.source_name(dep_id).unwrap_or(dep_id);
            resolved.sources.push(name.to_string());
        } else {
            let name = manifest
                .get_node(dep_id)
                .map(ManifestNode::display_name)
                .unwrap_or(dep_id);
            resolved.models.push(name.to_string());
        }
    }

    resolved
}
