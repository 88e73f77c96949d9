use ensemble::{
    ElementKey, Path, Schema, StoreBuilder, StoreKind, Value,
    schema::{Kind, SchemaConfig},
};

// ==========================
// VALUE AND KEY SHORTHANDS
// ==========================

/// Converts JSON test data into a [`Value`].
pub fn value(json: serde_json::Value) -> Value {
    Value::try_from(json).expect("Test data should be a valid value")
}

pub fn name(name: &str) -> ElementKey {
    ElementKey::from(name)
}

pub fn index(index: usize) -> ElementKey {
    ElementKey::from(index)
}

pub fn path(path: &str) -> Path {
    Path::from(path)
}

// ==========================
// SCHEMA FACTORIES
// ==========================

/// Three optional scalars `/a`, `/b` and `/c`.
pub fn abc_schema() -> Schema {
    let schema = Schema::new();
    for key in ["/a", "/b", "/c"] {
        schema.declare(key, Kind::Scalar).expect("Failed to declare scalar");
    }
    schema
}

/// A server description with nested maps, both list flavours and a uniform map.
pub fn server_schema() -> Schema {
    let config: SchemaConfig = serde_json::from_value(serde_json::json!({
        "paths": {
            "/host": "scalar",
            "/port": "scalar",
            "/mode": "scalar",
            "/ports": "ordered_list",
            "/ports/*": "scalar",
            "/tags": "unordered_list",
            "/tags/*": "scalar",
            "/limits/cpu": "scalar",
            "/limits/mem": "scalar",
            "/env": "hash",
            "/env/*": "scalar"
        },
        "rulesets": {
            "shallow": {"/limits": "keep"},
            "no_env": {"/env": "skip"}
        }
    }))
    .expect("Failed to parse schema config");
    Schema::from_config(&config).expect("Failed to build schema")
}

// ==========================
// STORE FACTORIES
// ==========================

/// A map store builder loaded with named elements.
pub fn map_builder(schema: Schema, elements: &[(&str, serde_json::Value)]) -> StoreBuilder {
    let mut builder = StoreBuilder::new(StoreKind::Map).with_schema(schema);
    for (element, data) in elements {
        builder
            .element(*element, value(data.clone()))
            .expect("Failed to load element");
    }
    builder
}

/// A list store builder loaded with elements; `None` entries are placeholders.
pub fn list_builder(
    kind: StoreKind,
    schema: Schema,
    elements: Vec<Option<serde_json::Value>>,
) -> StoreBuilder {
    let mut builder = StoreBuilder::new(kind).with_schema(schema);
    for data in elements {
        builder.push(data.map(value)).expect("Failed to load element");
    }
    builder
}
