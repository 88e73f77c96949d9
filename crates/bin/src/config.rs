//! Config file loading and store construction.
//!
//! The config file is JSON:
//!
//! ```json
//! {
//!   "store": {"kind": "map"},
//!   "schema": {"paths": {"/ports": "ordered_list", "/ports/*": "scalar"}},
//!   "defaults": [{"element": "base"}, {"element": "fast", "conditions": ["/mode=fast"]}]
//! }
//! ```
//!
//! `store.fully_defined` overrides `schema.fully_defined` when set.

use std::path::Path;

use ensemble::{
    Schema, Store, StoreBuilder,
    merge::Condition,
    schema::SchemaConfig,
    source::{JsonFile, Source},
    store::StoreOptions,
};
use serde::Deserialize;

/// One default rule, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultConfig {
    /// Element to use; omitted in list stores
    pub element: Option<String>,
    pub ruleset: Option<String>,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreOptions,
    pub schema: SchemaConfig,
    pub defaults: Vec<DefaultConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Loads the data file into a store built from `config`.
pub fn open_store(config: &Config, data: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    let schema = Schema::from_config(&config.schema)?;
    let mut builder = StoreBuilder::from_options(config.store).with_schema(schema);

    let source = JsonFile::new(data).with_kind(config.store.kind);
    builder.load(source.load()?)?;

    for rule in &config.defaults {
        let conditions = rule
            .conditions
            .iter()
            .map(|c| c.parse::<Condition>())
            .collect::<Result<Vec<_>, _>>()?;
        builder.declare_default(rule.element.as_deref(), rule.ruleset.as_deref(), conditions)?;
    }

    let store = builder.build();
    tracing::info!(
        data = %data.display(),
        kind = %store.kind(),
        elements = store.len(),
        defaults = store.rules().len(),
        "Opened store"
    );
    Ok(store)
}
