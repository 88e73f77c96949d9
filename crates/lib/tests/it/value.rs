//! Value tree integration tests
//!
//! Covers JSON conversion, the absent/empty/populated distinction, and editing
//! subtrees through schema addresses.

use ensemble::{
    Value,
    address::{self, Resolved},
    value::{Scalar, ValueKind},
};
use serde_json::json;

use crate::helpers::{path, server_schema, value};

#[test]
fn test_json_conversion_preserves_structure() {
    let data = json!({"host": "a", "ports": [80, 443], "limits": {"cpu": 2}, "note": null});
    let converted = value(data.clone());

    assert_eq!(converted.kind(), ValueKind::Map);
    assert_eq!(serde_json::Value::from(&converted), data);

    // Serde goes through the same natural JSON form
    let round: Value = serde_json::from_str(&serde_json::to_string(&converted).unwrap()).unwrap();
    assert_eq!(round, converted);
}

#[test]
fn test_fractional_numbers_rejected() {
    let err = Value::try_from(json!({"ratio": 0.5})).unwrap_err();
    assert!(!err.is_type_error());

    let crate_err: ensemble::Error = err.into();
    assert_eq!(crate_err.module(), "value");
}

#[test]
fn test_three_states_are_distinct() {
    let populated = value(json!({"a": 1}));
    let empty_map = value(json!({"a": {}}));
    let empty_text = value(json!({"a": ""}));

    assert!(populated.is_populated());
    assert!(empty_map.is_empty());
    assert!(empty_text.is_empty());
    // Empty is still present
    assert!(empty_map.as_map().unwrap().contains_key("a"));
    assert_ne!(empty_map, Value::map());
}

#[test]
fn test_copies_are_independent() {
    let original = value(json!({"limits": {"cpu": 1}}));
    let mut copy = original.clone();
    copy.as_map_mut()
        .unwrap()
        .insert("host".to_string(), Value::from("b"));

    assert_ne!(copy, original);
    assert!(original.as_map().unwrap().get("host").is_none());
}

#[test]
fn test_set_at_creates_intermediate_containers() {
    let schema = server_schema();
    let address = schema.address(&path("/ports/2")).unwrap();

    let mut tree = Value::map();
    let previous = tree.set_at(address.steps(), Value::from(8080)).unwrap();
    assert_eq!(previous, Some(Value::null()));
    assert_eq!(tree, value(json!({"ports": [null, null, 8080]})));
}

#[test]
fn test_set_at_rejects_populated_kind_mismatch() {
    let schema = server_schema();
    let address = schema.address(&path("/limits/cpu")).unwrap();

    let mut tree = value(json!({"limits": "unlimited"}));
    let err = tree.set_at(address.steps(), Value::from(1)).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(tree, value(json!({"limits": "unlimited"})));
}

#[test]
fn test_erase_collapses_empty_parents() {
    let schema = server_schema();
    let cpu = schema.address(&path("/limits/cpu")).unwrap();
    let first_port = schema.address(&path("/ports/0")).unwrap();
    let first_tag = schema.address(&path("/tags/0")).unwrap();

    let mut tree = value(json!({
        "host": "a",
        "limits": {"cpu": 1},
        "ports": [80, 443],
        "tags": ["x", "y"]
    }));

    assert_eq!(tree.erase_at(cpu.steps()), Some(Value::from(1)));
    assert_eq!(tree.erase_at(first_port.steps()), Some(Value::from(80)));
    assert_eq!(tree.erase_at(first_tag.steps()), Some(Value::from("x")));

    // Ordered positions survive, unordered items shift
    assert_eq!(
        tree,
        value(json!({"host": "a", "ports": [null, 443], "tags": ["y"]}))
    );
}

#[test]
fn test_resolve_distinguishes_absent_from_mismatch() {
    let schema = server_schema();
    let cpu = schema.address(&path("/limits/cpu")).unwrap();

    let tree = value(json!({"host": "a"}));
    assert!(matches!(
        address::resolve(Some(&tree), &cpu).unwrap(),
        Resolved::Absent { depth: 0 }
    ));

    let tree = value(json!({"limits": 5}));
    assert!(address::resolve(Some(&tree), &cpu).is_err());

    let tree = value(json!({"limits": {"cpu": 4}}));
    assert_eq!(
        address::resolve(Some(&tree), &cpu).unwrap().value(),
        Some(&Value::Scalar(Scalar::Int(4)))
    );
}
