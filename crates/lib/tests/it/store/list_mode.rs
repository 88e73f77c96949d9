//! List store tests: elements addressed by position.

use ensemble::{
    Error, Store, StoreKind, Value,
    merge::Condition,
    source::Elements,
    store::StoreError,
};
use serde_json::json;

use crate::helpers::{index, list_builder, name, server_schema, value};

/// `[def1, def2, ele1, ele2, ele3]` with the first two declared as defaults.
fn ordered_with_defaults() -> Store {
    let mut builder = list_builder(
        StoreKind::OrderedList,
        server_schema(),
        vec![
            Some(json!({"host": "default.local", "port": 80})),
            Some(json!({"mode": "fast", "port": 1})),
            Some(json!({"host": "a"})),
            Some(json!({"host": "b"})),
            Some(json!({"host": "c"})),
        ],
    );
    assert_eq!(builder.declare_default(None, None, []).unwrap(), 0);
    assert_eq!(builder.declare_default(None, None, []).unwrap(), 1);
    builder.build()
}

fn unordered(count: usize) -> Store {
    let elements = (0..count)
        .map(|i| Some(json!({"host": format!("h{i}")})))
        .collect();
    list_builder(StoreKind::UnorderedList, server_schema(), elements).build()
}

#[test]
fn test_declaring_defaults_consumes_leading_elements() {
    let store = ordered_with_defaults();

    assert_eq!(store.list(false), vec![index(0), index(1), index(2)]);
    assert_eq!(store.get_raw(&index(0)).unwrap(), Some(&value(json!({"host": "a"}))));
    assert_eq!(store.get_raw(&index(2)).unwrap(), Some(&value(json!({"host": "c"}))));
    assert_eq!(
        store.get_effective(&index(1)).unwrap(),
        Some(&value(json!({"host": "b", "port": 80, "mode": "fast"})))
    );
}

#[test]
fn test_ordered_delete_leaves_placeholder() {
    let mut store = ordered_with_defaults();

    store.delete(&index(0)).unwrap();

    assert_eq!(store.list(true), vec![index(0), index(1), index(2)]);
    assert_eq!(store.list(false), vec![index(1), index(2)]);
    assert!(store.exists(&index(0), true));
    assert!(!store.exists(&index(0), false));
    assert_eq!(store.get_raw(&index(0)).unwrap(), None);
    assert_eq!(store.get_raw(&index(1)).unwrap(), Some(&value(json!({"host": "b"}))));
    assert_eq!(store.get_raw(&index(2)).unwrap(), Some(&value(json!({"host": "c"}))));

    // A placeholder shows the merged defaults alone
    assert_eq!(
        store.get_effective(&index(0)).unwrap(),
        Some(&value(json!({"host": "default.local", "port": 80, "mode": "fast"})))
    );
}

#[test]
fn test_path_values_skip_placeholders() {
    let mut store = ordered_with_defaults();
    store.delete(&index(0)).unwrap();
    let port = crate::helpers::path("/port");

    // The placeholder only carries defaults, like in `list` and `which`
    let ports = store.path_values_copy(&port, false).unwrap();
    assert_eq!(ports.keys().cloned().collect::<Vec<_>>(), vec![index(1), index(2)]);
    let default_port: Condition = "/port=80".parse().unwrap();
    assert_eq!(store.which(&[default_port]).unwrap(), vec![index(1), index(2)]);

    let ports = store.path_values_copy(&port, true).unwrap();
    assert_eq!(ports.get(&index(0)), Some(&Value::from(80)));
    assert_eq!(ports.len(), 3);
}

#[test]
fn test_placeholders_are_filled_by_add() {
    let mut store = ordered_with_defaults();
    store.delete(&index(0)).unwrap();

    let err = store
        .update(&index(0), &crate::helpers::path("/host"), Value::from("z"))
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::ElementIsEmpty { .. })));

    let key = store
        .add(Some(index(0)), value(json!({"host": "z"})), false)
        .unwrap();
    assert_eq!(key, index(0));
    assert_eq!(store.list(false), vec![index(0), index(1), index(2)]);
}

#[test]
fn test_ordered_add_placement() {
    let mut store = ordered_with_defaults();

    // Past the end extends with placeholders
    let key = store.add(Some(index(5)), value(json!({"host": "f"})), false).unwrap();
    assert_eq!(key, index(5));
    assert_eq!(store.len(), 6);
    assert_eq!(store.get_raw(&index(3)).unwrap(), None);
    assert_eq!(
        store.get_effective(&index(4)).unwrap(),
        Some(&value(json!({"host": "default.local", "port": 80, "mode": "fast"})))
    );
    assert_eq!(store.list(false), vec![index(0), index(1), index(2), index(5)]);

    // An occupied index inserts before it
    store.add(Some(index(1)), value(json!({"host": "ab"})), false).unwrap();
    assert_eq!(store.get_raw(&index(1)).unwrap(), Some(&value(json!({"host": "ab"}))));
    assert_eq!(store.get_raw(&index(2)).unwrap(), Some(&value(json!({"host": "b"}))));
    assert_eq!(store.get_raw(&index(6)).unwrap(), Some(&value(json!({"host": "f"}))));

    // Plain append
    let key = store.add(None, value(json!({"host": "g"})), false).unwrap();
    assert_eq!(key, index(7));
}

#[test]
fn test_unordered_add_placement() {
    let mut store = unordered(3);

    let key = store.add(Some(index(0)), value(json!({"host": "first"})), false).unwrap();
    assert_eq!(key, index(0));
    assert_eq!(store.get_raw(&index(1)).unwrap(), Some(&value(json!({"host": "h0"}))));

    let err = store
        .add(Some(index(10)), value(json!({"host": "x"})), false)
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::InvalidPosition { .. })));
    assert_eq!(store.len(), 4);
}

#[test]
fn test_unordered_delete_tail_only() {
    let mut store = unordered(3);

    let err = store.delete(&index(0)).unwrap_err();
    match err {
        Error::Store(StoreError::NotLastElement { key, last }) => {
            assert_eq!(key, index(0));
            assert_eq!(last, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.len(), 3);

    store.delete(&index(2)).unwrap();
    store.delete(&index(1)).unwrap();
    assert_eq!(store.list(true), vec![index(0)]);
}

#[test]
fn test_unordered_delete_ignores_trailing_empty_slots() {
    let mut store = list_builder(
        StoreKind::UnorderedList,
        server_schema(),
        vec![Some(json!({"host": "a"})), Some(json!({"host": "b"})), None],
    )
    .build();

    let err = store.delete(&index(0)).unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::NotLastElement { last: 1, .. })
    ));

    // The last populated element takes the empty slot after it along
    store.delete(&index(1)).unwrap();
    assert_eq!(store.list(true), vec![index(0)]);

    store.add(None, value(json!({"host": "c"})), false).unwrap();
    assert_eq!(store.get_raw(&index(1)).unwrap(), Some(&value(json!({"host": "c"}))));
}

#[test]
fn test_huge_positions_are_rejected() {
    let mut store = ordered_with_defaults();

    let err = store
        .add(Some(index(usize::MAX)), value(json!({"host": "far"})), false)
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::InvalidPosition { .. })));
    assert_eq!(store.len(), 3);

    let err = store
        .update(
            &index(0),
            &crate::helpers::path(&format!("/ports/{}", usize::MAX)),
            Value::from(1),
        )
        .unwrap_err();
    assert!(err.is_address_error());
    assert_eq!(store.get_raw(&index(0)).unwrap(), Some(&value(json!({"host": "a"}))));
}

#[test]
fn test_list_modes_reject_names() {
    let mut store = unordered(2);

    let err = store.rename(&index(0), &index(1)).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::UnsupportedInMode { .. })));

    let err = store.get_raw(&name("zero")).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::WrongKeyKind { .. })));

    let mut builder = list_builder(StoreKind::OrderedList, server_schema(), vec![]);
    let err = builder.element("x", value(json!({"host": "x"}))).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::UnsupportedInMode { .. })));
}

#[test]
fn test_copy_appends() {
    let mut store = ordered_with_defaults();

    let key = store.copy(&index(0), None).unwrap();
    assert_eq!(key, index(3));
    assert_eq!(store.get_raw(&key).unwrap(), Some(&value(json!({"host": "a"}))));
}

#[test]
fn test_snapshot_puts_defaults_first() {
    let mut store = ordered_with_defaults();
    store.delete(&index(1)).unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.kind, StoreKind::OrderedList);
    assert_eq!(
        snapshot.elements,
        Elements::Positional(vec![
            Some(value(json!({"host": "default.local", "port": 80}))),
            Some(value(json!({"mode": "fast", "port": 1}))),
            Some(value(json!({"host": "a"}))),
            None,
            Some(value(json!({"host": "c"}))),
        ])
    );
}
