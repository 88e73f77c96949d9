//! Named merge strategies used when applying defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::Node;
use crate::path::Path;

/// Name of the ruleset that always exists.
pub const DEFAULT_RULESET: &str = "default";

/// How default values are taken at one schema path.
///
/// No method ever overwrites a populated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// Fill recursively: maps key by key, ordered lists position by position
    Merge,
    /// Take the default subtree whole, only if nothing is there yet
    Keep,
    /// Never take default values at or below this path
    Skip,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Keep => "keep",
            MergeMethod::Skip => "skip",
        })
    }
}

/// A set of per-path merge method overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    methods: BTreeMap<Path, MergeMethod>,
}

impl Ruleset {
    /// Creates a ruleset with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the explicit override for a schema path, if any.
    pub fn get(&self, schema_path: &Path) -> Option<MergeMethod> {
        self.methods.get(schema_path).copied()
    }

    /// Iterates over all overrides.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &MergeMethod)> {
        self.methods.iter()
    }

    pub(crate) fn set(&mut self, schema_path: Path, method: MergeMethod) {
        self.methods.insert(schema_path, method);
    }

    /// The method to use at `schema_path`, falling back to the node's default:
    /// recursive merge for maps and ordered lists, keep for everything else.
    pub(crate) fn method_for(&self, schema_path: &Path, node: &Node) -> MergeMethod {
        self.get(schema_path).unwrap_or(match node {
            Node::Map(_) | Node::Hash(_) | Node::List { ordered: true, .. } => MergeMethod::Merge,
            _ => MergeMethod::Keep,
        })
    }
}
