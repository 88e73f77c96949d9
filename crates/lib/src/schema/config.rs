use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Kind, MergeMethod};
use crate::path::Path;

/// Serializable description of a schema: declared paths and rulesets.
///
/// ```
/// # use ensemble::schema::{SchemaConfig, Schema};
/// let config: SchemaConfig = serde_json::from_str(r#"{
///     "fully_defined": true,
///     "paths": {"/name": "scalar", "/ports": "ordered_list", "/ports/*": "scalar"},
///     "rulesets": {"strict": {"/ports": "keep"}}
/// }"#).unwrap();
/// let schema = Schema::from_config(&config).unwrap();
/// assert!(schema.has_ruleset("strict"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Reject values whose structure is not already declared
    pub fully_defined: bool,
    /// Declared node kinds by schema path
    pub paths: BTreeMap<Path, Kind>,
    /// Merge method overrides by ruleset name, then schema path
    pub rulesets: BTreeMap<String, BTreeMap<Path, MergeMethod>>,
}
