//! Applied-test inference from macro dependencies
//!
//! dbt does not record on a model which tests target it; the test nodes
//! point at the model, not the other way round. Test nodes are excluded from
//! the corpus, so the only hint left on the model is its
//! `depends_on.macros` list. This is a naming heuristic:
//!
//! - false positives: any macro whose id contains "test" counts, including
//!   helpers such as `macro.shop.get_test_window`;
//! - false negatives: custom generic tests named without "test" are missed.
//!
//! It relies on the project keeping dbt's `test_<name>` macro convention.
//!
//! Adapter dispatch variants (`macro.dbt.snowflake__test_unique`) are the
//! same test as their generic macro and are recorded under the generic name.

use regex::Regex;
use crate::lookup::LookupTables;
use crate::manifest::{trailing_segment, ManifestNode};

/// Built-in and package generic tests: `macro.<package>.test_<name>`,
/// plus adapter dispatch variants `macro.<package>.default__test_<name>`
const TEST_MACRO_PATTERN: &str = r"^macro\.[A-Za-z0-9_]+\.(?:[A-Za-z0-9_]+__)?(?P<test>test_[A-Za-z0-9_]+)$";

/// Decides which macro dependencies are test invocations
#[derive(Debug, Clone)]
pub struct TestDetector {
    builtin_pattern: Regex,
}

impl Default for TestDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDetector {
    pub fn new() -> Self {
        Self {
            builtin_pattern: Regex::new(TEST_MACRO_PATTERN).expect("valid test macro pattern"),
        }
    }

    /// Check if a macro id looks like a test invocation
    pub fn is_test_macro(&self, macro_id: &str) -> bool {
        macro_id.to_ascii_lowercase().contains("test")
    }

    /// Name a test macro is recorded under
    ///
    /// Generic test macros, dispatched or not, give `test_<name>`. Anything
    /// else uses the macro table, then the trailing id segment.
    pub fn test_name<'a>(&self, macro_id: &'a str, tables: &'a LookupTables) -> &'a str {
        if let Some(generic) = self.builtin_pattern.captures(macro_id).and_then(|caps| caps.name("test")) {
            return generic.as_str();
        }

        tables
            .macro_name(macro_id)
            .unwrap_or_else(|| trailing_segment(macro_id))
    }

    /// Test names applied by a node, in dependency order without repeats
    ///
    /// See [`TestDetector::test_name`] for how each macro is named.
    pub fn infer_tests(&self, node: &ManifestNode, tables: &LookupTables) -> Vec<String> {
        let mut tests: Vec<String> = Vec::new();

        for macro_id in node.depends_on.macros.iter().filter(|id| self.is_test_macro(id)) {
            let name = self.test_name(macro_id, tables);

            if !tests.iter().any(|existing| existing == name) {
                tests.push(name.to_string());
            }
        }

        tests
    }
}
