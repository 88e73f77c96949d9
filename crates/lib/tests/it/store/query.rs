//! Query layer tests: path reads over raw and effective values.

use std::collections::BTreeMap;

use ensemble::{
    Error, Store, Value, View,
    merge::{Condition, Origin},
    store::StoreError,
};
use serde_json::json;

use crate::helpers::{map_builder, name, path, server_schema, value};

fn store() -> Store {
    let mut builder = map_builder(
        server_schema(),
        &[
            ("base", json!({"port": 80, "tags": ["std"], "env": {"LANG": "C"}})),
            (
                "web",
                json!({"host": "web", "mode": "fast", "ports": [8080], "env": {"DEBUG": "1"}}),
            ),
            ("db", json!({"host": "db", "port": 5432, "limits": {"cpu": ""}})),
            ("worker", json!({"host": "", "mode": "slow"})),
        ],
    );
    builder.declare_default(Some("base"), None, []).unwrap();
    builder.build()
}

fn conditions(texts: &[&str]) -> Vec<Condition> {
    texts.iter().map(|t| t.parse().unwrap()).collect()
}

#[test]
fn test_value_raw_and_effective() {
    let store = store();

    assert_eq!(
        store.value(&name("web"), &path("/port"), View::Effective).unwrap(),
        &Value::from(80)
    );
    let err = store
        .value(&name("web"), &path("/port"), View::Raw)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::Store(StoreError::PathNotFound { .. })));

    let owned = store
        .value_copy(&name("web"), &path("/env"), View::Effective)
        .unwrap();
    assert_eq!(owned, value(json!({"DEBUG": "1", "LANG": "C"})));
}

#[test]
fn test_keys() {
    let store = store();

    assert_eq!(
        store.keys(&name("web"), &path("/env"), false, View::Effective).unwrap(),
        vec!["DEBUG", "LANG"]
    );
    assert_eq!(
        store.keys(&name("web"), &path("/env"), false, View::Raw).unwrap(),
        vec!["DEBUG"]
    );
    assert_eq!(
        store.keys(&name("web"), &path("/ports"), false, View::Raw).unwrap(),
        vec!["0"]
    );

    // Absent containers have no keys
    assert!(store
        .keys(&name("web"), &path("/limits"), false, View::Raw)
        .unwrap()
        .is_empty());

    // Empty children only on request
    assert!(store
        .keys(&name("db"), &path("/limits"), false, View::Raw)
        .unwrap()
        .is_empty());
    assert_eq!(
        store.keys(&name("db"), &path("/limits"), true, View::Raw).unwrap(),
        vec!["cpu"]
    );
}

#[test]
fn test_keys_on_scalar_fails() {
    let store = store();

    let err = store
        .keys(&name("web"), &path("/host"), false, View::Effective)
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NotAContainer { .. })));
    assert!(err.is_type_error());
}

#[test]
fn test_values() {
    let store = store();

    assert_eq!(
        store.values(&name("web"), &path("/tags"), false, View::Effective).unwrap(),
        vec![&Value::from("std")]
    );
    assert!(store
        .values(&name("web"), &path("/tags"), false, View::Raw)
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .values_copy(&name("web"), &path("/ports"), false, View::Raw)
            .unwrap(),
        vec![Value::from(8080)]
    );
}

#[test]
fn test_which() {
    let store = store();

    assert_eq!(store.which(&conditions(&["/mode=fast"])).unwrap(), vec![name("web")]);
    assert_eq!(store.which(&conditions(&["/port>=1000"])).unwrap(), vec![name("db")]);
    assert_eq!(store.which(&conditions(&["!/mode"])).unwrap(), vec![name("db")]);
    // Defaults count, default elements do not
    assert_eq!(
        store.which(&conditions(&["/tags~std"])).unwrap(),
        vec![name("db"), name("web"), name("worker")]
    );
    assert_eq!(
        store.which(&conditions(&["/tags~std", "/mode"])).unwrap(),
        vec![name("web"), name("worker")]
    );
    assert_eq!(store.which(&[]).unwrap().len(), 3);
}

#[test]
fn test_which_rejects_invalid_paths() {
    let store = store();
    store.schema().set_fully_defined(true);

    let err = store.which(&conditions(&["/nonexistent=1"])).unwrap_err();
    assert!(err.is_address_error());
}

#[test]
fn test_path_values() {
    let store = store();

    let ports = store.path_values_copy(&path("/port"), false).unwrap();
    let expected: BTreeMap<_, _> = [
        (name("db"), Value::from(5432)),
        (name("web"), Value::from(80)),
        (name("worker"), Value::from(80)),
    ]
    .into_iter()
    .collect();
    assert_eq!(ports, expected);

    let hosts = store.path_values(&path("/host"), false).unwrap();
    assert_eq!(hosts.keys().cloned().collect::<Vec<_>>(), vec![name("db"), name("web")]);
    let hosts = store.path_values(&path("/host"), true).unwrap();
    assert_eq!(hosts.len(), 3);
}

#[test]
fn test_path_in_use() {
    let store = store();

    // Default elements count
    assert!(store.path_in_use(&path("/env/LANG"), false).unwrap());
    assert!(store.path_in_use(&path("/ports"), false).unwrap());
    assert!(!store.path_in_use(&path("/limits/mem"), false).unwrap());
    assert!(!store.path_in_use(&path("/limits/cpu"), false).unwrap());
    assert!(store.path_in_use(&path("/limits/cpu"), true).unwrap());
}

#[test]
fn test_origin() {
    let store = store();
    let web = name("web");

    assert_eq!(store.origin(&web, &path("/host")).unwrap(), Origin::Raw);
    assert_eq!(
        store.origin(&web, &path("/port")).unwrap(),
        Origin::Default { rule: 0 }
    );
    assert_eq!(store.origin(&web, &path("/env")).unwrap(), Origin::Raw);
    assert!(store.is_default_value(&web, &path("/env/LANG")).unwrap());
    assert!(!store.is_default_value(&web, &path("/env/DEBUG")).unwrap());

    let err = store.origin(&web, &path("/limits")).unwrap_err();
    assert!(err.is_not_found());
}
