//! Source integration tests
//!
//! Stores are loaded from and saved to sources; effective values must be
//! reproducible from the saved raw state plus the same default declarations.

use ensemble::{
    Error, Store, StoreBuilder, StoreKind, Value,
    schema::Kind,
    source::{Elements, InMemory, JsonFile, Snapshot, Source, SourceError},
};
use serde_json::json;

use crate::helpers::{index, name, path, server_schema, value};

fn open(source: &dyn Source, kind: StoreKind) -> ensemble::Result<Store> {
    let mut builder = StoreBuilder::new(kind).with_schema(server_schema());
    builder.load(source.load()?)?;
    if kind == StoreKind::Map {
        builder.declare_default(Some("base"), None, [])?;
    } else {
        builder.declare_default(None, None, [])?;
    }
    Ok(builder.build())
}

#[test]
fn test_json_file_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("servers.json");
    std::fs::write(
        &file,
        json!({
            "kind": "map",
            "elements": {
                "base": {"port": 80},
                "web": {"host": "web"},
                "gone": null
            }
        })
        .to_string(),
    )
    .unwrap();

    let source = JsonFile::new(&file).with_kind(StoreKind::Map);
    let mut store = open(&source, StoreKind::Map).unwrap();
    assert_eq!(store.list(true), vec![name("gone"), name("web")]);
    assert_eq!(store.list(false), vec![name("web")]);

    store.update(&name("web"), &path("/port"), Value::from(8080)).unwrap();
    store.delete(&name("gone")).unwrap();
    let effective = store.get_effective(&name("web")).unwrap().cloned();
    source.save(&store.snapshot()).unwrap();

    let reopened = open(&source, StoreKind::Map).unwrap();
    assert_eq!(reopened.get_effective(&name("web")).unwrap().cloned(), effective);
    assert_eq!(reopened.list(true), vec![name("web")]);
    assert!(reopened.is_default_element(&name("base")));
}

#[test]
fn test_list_round_trip_restores_defaults() {
    let source = InMemory::new(Snapshot {
        kind: StoreKind::OrderedList,
        elements: Elements::Positional(vec![
            Some(value(json!({"port": 80}))),
            Some(value(json!({"host": "a"}))),
            Some(value(json!({"host": "b"}))),
        ]),
    });

    let mut store = open(&source, StoreKind::OrderedList).unwrap();
    store.delete(&index(0)).unwrap();
    source.save(&store.snapshot()).unwrap();

    let reopened = open(&source, StoreKind::OrderedList).unwrap();
    assert_eq!(reopened.list(true), vec![index(0), index(1)]);
    assert_eq!(reopened.list(false), vec![index(1)]);
    assert_eq!(
        reopened.get_effective(&index(1)).unwrap(),
        Some(&value(json!({"host": "b", "port": 80})))
    );
    assert_eq!(source.saves().len(), 1);
}

#[test]
fn test_kind_mismatch() {
    let source = InMemory::empty(StoreKind::UnorderedList);
    let mut builder = StoreBuilder::new(StoreKind::Map);

    let err = builder.load(source.load().unwrap()).unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::KindMismatch {
            expected: StoreKind::Map,
            found: StoreKind::UnorderedList
        })
    ));
    assert_eq!(err.module(), "source");
}

#[test]
fn test_nonconforming_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(
        &file,
        json!({"kind": "unordered_list", "elements": [{"host": {"name": "x"}}]}).to_string(),
    )
    .unwrap();

    let err = open(&JsonFile::new(&file), StoreKind::UnorderedList).unwrap_err();
    assert!(err.is_conformance_error());
}

#[test]
fn test_rejected_snapshot_changes_nothing() {
    let source = InMemory::new(Snapshot {
        kind: StoreKind::UnorderedList,
        elements: Elements::Positional(vec![
            Some(value(json!({"a": 1, "z": 9}))),
            Some(value(json!({"a": [1]}))),
        ]),
    });
    let mut builder = StoreBuilder::new(StoreKind::UnorderedList);
    builder.push(Some(value(json!({"b": "kept"})))).unwrap();

    let err = builder.load(source.load().unwrap()).unwrap_err();
    assert!(err.is_conformance_error());
    assert_eq!(builder.schema().kind_of(&path("/z")), None);
    assert_eq!(builder.schema().kind_of(&path("/b")), Some(Kind::Scalar));

    let store = builder.build();
    assert_eq!(store.len(), 1);
}

#[test]
fn test_null_elements_survive_a_save() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonFile::new(dir.path().join("nulls.json")).with_kind(StoreKind::UnorderedList);
    source
        .save(&Snapshot {
            kind: StoreKind::UnorderedList,
            elements: Elements::Positional(vec![Some(Value::null()), None, Some(value(json!({"host": "a"})))]),
        })
        .unwrap();

    let mut builder = StoreBuilder::new(StoreKind::UnorderedList).with_schema(server_schema());
    builder.load(source.load().unwrap()).unwrap();
    let store = builder.build();
    assert_eq!(store.get_raw(&index(0)).unwrap(), Some(&Value::null()));
    assert_eq!(store.get_raw(&index(1)).unwrap(), None);
    assert_eq!(store.snapshot(), source.load().unwrap());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonFile::new(dir.path().join("absent.json"));

    let err: Error = source.load().unwrap_err().into();
    assert!(err.is_io_error());

    // With an expected kind, a missing file is an empty store
    let source = source.with_kind(StoreKind::Map);
    let mut builder = StoreBuilder::new(StoreKind::Map);
    builder.load(source.load().unwrap()).unwrap();
    assert!(builder.build().is_empty());
}
