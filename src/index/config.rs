//! Per-index configuration.

use smol_str::SmolStr;

use crate::base::FqnSyntax;

/// Settings for one [`IndexEngine`](super::IndexEngine).
///
/// ```
/// use symdex::{FqnSyntax, IndexConfig};
///
/// let config = IndexConfig::new("stdlib").with_syntax(FqnSyntax::new("::"));
/// assert_eq!(config.name(), "stdlib");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    /// Label used in log output and to address the index inside a composite.
    name: SmolStr,
    /// How fqns are split into namespace and unqualified name.
    syntax: FqnSyntax,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: SmolStr::new_static("index"),
            syntax: FqnSyntax::default(),
        }
    }
}

impl IndexConfig {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: SmolStr::new(name),
            ..Self::default()
        }
    }

    pub fn with_syntax(mut self, syntax: FqnSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax(&self) -> &FqnSyntax {
        &self.syntax
    }
}
