//! Applying default rules to elements.

use ensemble::{
    Store, StoreKind, Value, View,
    merge::{Condition, Origin},
};
use serde_json::json;

use crate::helpers::{abc_schema, list_builder, map_builder, name, path, server_schema, value};

/// Unconditional `d1 = {a: 1}`, then `d2 = {b: 2}` only where `a == 1`.
fn conditional_chain() -> Store {
    let mut builder = map_builder(
        abc_schema(),
        &[
            ("d1", json!({"a": 1})),
            ("d2", json!({"b": 2})),
            ("e1", json!({"a": 1})),
            ("e2", json!({"a": 2})),
            ("e3", json!({"c": 3})),
        ],
    );
    builder.declare_default(Some("d1"), None, []).unwrap();
    builder
        .declare_default(Some("d2"), None, [Condition::eq("/a", 1)])
        .unwrap();
    builder.build()
}

#[test]
fn test_conditional_chain() {
    let store = conditional_chain();

    assert_eq!(store.list(false), vec![name("e1"), name("e2"), name("e3")]);
    assert_eq!(
        store.get_effective(&name("e1")).unwrap(),
        Some(&value(json!({"a": 1, "b": 2})))
    );
    assert_eq!(
        store.get_effective(&name("e2")).unwrap(),
        Some(&value(json!({"a": 2})))
    );
    // The condition sees the value the first rule supplied
    assert_eq!(
        store.get_effective(&name("e3")).unwrap(),
        Some(&value(json!({"a": 1, "b": 2, "c": 3})))
    );

    assert!(!store.is_default_value(&name("e1"), &path("/a")).unwrap());
    assert_eq!(
        store.origin(&name("e3"), &path("/a")).unwrap(),
        Origin::Default { rule: 0 }
    );
    assert_eq!(
        store.origin(&name("e3"), &path("/b")).unwrap(),
        Origin::Default { rule: 1 }
    );
    assert_eq!(store.origin(&name("e3"), &path("/c")).unwrap(), Origin::Raw);
}

#[test]
fn test_mutation_reevaluates_conditions() {
    let mut store = conditional_chain();

    store.update(&name("e2"), &path("/a"), Value::from(1)).unwrap();
    assert_eq!(
        store.get_effective(&name("e2")).unwrap(),
        Some(&value(json!({"a": 1, "b": 2})))
    );

    // Changing the first default changes which elements the second reaches
    store.update(&name("d1"), &path("/a"), Value::from(5)).unwrap();
    assert_eq!(
        store.get_effective(&name("e3")).unwrap(),
        Some(&value(json!({"a": 5, "c": 3})))
    );
}

#[test]
fn test_earlier_rules_win() {
    let build = |order: [&str; 2]| {
        let mut builder = map_builder(
            abc_schema(),
            &[
                ("x", json!({"b": "from x"})),
                ("y", json!({"b": "from y", "c": "from y"})),
                ("e", json!({"a": "raw"})),
            ],
        );
        for default in order {
            builder.declare_default(Some(default), None, []).unwrap();
        }
        builder.build()
    };

    let store = build(["x", "y"]);
    assert_eq!(
        store.get_effective(&name("e")).unwrap(),
        Some(&value(json!({"a": "raw", "b": "from x", "c": "from y"})))
    );
    assert_eq!(
        store.origin(&name("e"), &path("/c")).unwrap(),
        Origin::Default { rule: 1 }
    );

    let store = build(["y", "x"]);
    assert_eq!(
        store.get_effective(&name("e")).unwrap(),
        Some(&value(json!({"a": "raw", "b": "from y", "c": "from y"})))
    );
}

#[test]
fn test_defaults_fill_empty_but_never_overwrite() {
    let mut builder = map_builder(
        abc_schema(),
        &[
            ("d", json!({"a": 1, "b": 2, "c": 3})),
            ("e", json!({"a": "", "b": null, "c": 0})),
        ],
    );
    builder.declare_default(Some("d"), None, []).unwrap();
    let store = builder.build();

    assert_eq!(
        store.get_effective(&name("e")).unwrap(),
        Some(&value(json!({"a": 1, "b": 2, "c": 0})))
    );
    assert!(store.is_default_value(&name("e"), &path("/a")).unwrap());
    assert!(!store.is_default_value(&name("e"), &path("/c")).unwrap());
    // Raw keeps what was authored
    assert_eq!(
        store.value(&name("e"), &path("/a"), View::Raw).unwrap(),
        &Value::from("")
    );
}

#[test]
fn test_rulesets_control_depth() {
    let mut builder = map_builder(
        server_schema(),
        &[
            ("base", json!({"limits": {"cpu": 1, "mem": 512}, "env": {"LANG": "C"}})),
            ("partial", json!({"limits": {"cpu": 2}, "env": {"TZ": "UTC"}})),
            ("bare", json!({"host": "bare"})),
        ],
    );
    builder.declare_default(Some("base"), Some("shallow"), []).unwrap();
    let store = builder.build();

    // Kept subtrees are taken whole or not at all
    assert_eq!(
        store.get_effective(&name("partial")).unwrap(),
        Some(&value(json!({"limits": {"cpu": 2}, "env": {"LANG": "C", "TZ": "UTC"}})))
    );
    assert_eq!(
        store.get_effective(&name("bare")).unwrap(),
        Some(&value(json!({
            "host": "bare",
            "limits": {"cpu": 1, "mem": 512},
            "env": {"LANG": "C"}
        })))
    );

    let mut builder = map_builder(
        server_schema(),
        &[
            ("base", json!({"port": 80, "env": {"LANG": "C"}})),
            ("bare", json!({"host": "bare"})),
        ],
    );
    builder.declare_default(Some("base"), Some("no_env"), []).unwrap();
    let store = builder.build();
    assert_eq!(
        store.get_effective(&name("bare")).unwrap(),
        Some(&value(json!({"host": "bare", "port": 80})))
    );
}

#[test]
fn test_ordered_lists_merge_by_position() {
    let mut builder = list_builder(
        StoreKind::UnorderedList,
        server_schema(),
        vec![
            Some(json!({"ports": [80, 443, 8443], "tags": ["a", "b"]})),
            Some(json!({"ports": [8080, null], "tags": ["c"]})),
            Some(json!({"host": "bare"})),
        ],
    );
    builder.declare_default(None, None, []).unwrap();
    let store = builder.build();

    assert_eq!(
        store.get_effective(&crate::helpers::index(0)).unwrap(),
        Some(&value(json!({"ports": [8080, 443, 8443], "tags": ["c"]})))
    );
    assert_eq!(
        store.origin(&crate::helpers::index(0), &path("/ports/1")).unwrap(),
        Origin::Default { rule: 0 }
    );
    assert_eq!(
        store.get_effective(&crate::helpers::index(1)).unwrap(),
        Some(&value(json!({"host": "bare", "ports": [80, 443, 8443], "tags": ["a", "b"]})))
    );
}

#[test]
fn test_recompute_is_idempotent() {
    let mut store = conditional_chain();
    let before = store.effective(&name("e3")).unwrap().clone();

    // Writing the same value back recomputes without changing anything
    store.update(&name("e3"), &path("/c"), Value::from(3)).unwrap();
    assert_eq!(store.effective(&name("e3")).unwrap(), &before);

    store.update(&name("d2"), &path("/b"), Value::from(2)).unwrap();
    assert_eq!(store.effective(&name("e3")).unwrap(), &before);
}
