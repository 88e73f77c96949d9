//! Declaring default rules on the store builder.

use ensemble::{
    Error, StoreKind,
    merge::{Condition, DefaultError},
};
use serde_json::json;

use crate::helpers::{abc_schema, list_builder, map_builder, server_schema};

fn default_error(err: Error) -> DefaultError {
    match err {
        Error::Default(err) => err,
        other => panic!("expected a default declaration error, got {other}"),
    }
}

#[test]
fn test_map_store_requires_existing_populated_element() {
    let mut builder = map_builder(
        abc_schema(),
        &[("d", json!({"a": 1})), ("blank", json!({"a": ""}))],
    );

    let err = default_error(builder.declare_default(None, None, []).unwrap_err());
    assert_eq!(err, DefaultError::KeyRequired { rule: 0 });

    let err = builder.declare_default(Some("missing"), None, []).unwrap_err();
    assert!(err.is_not_found());

    let err = default_error(builder.declare_default(Some("blank"), None, []).unwrap_err());
    assert!(matches!(err, DefaultError::EmptyDefault { rule: 0, .. }));

    // Failed declarations do not use up rule indices
    assert_eq!(builder.declare_default(Some("d"), None, []).unwrap(), 0);

    let err = default_error(builder.declare_default(Some("d"), None, []).unwrap_err());
    assert_eq!(
        err,
        DefaultError::AlreadyDefault {
            rule: 1,
            key: "d".to_string()
        }
    );
}

#[test]
fn test_list_store_consumes_first_element() {
    let mut builder = list_builder(StoreKind::UnorderedList, abc_schema(), vec![]);
    let err = default_error(builder.declare_default(None, None, []).unwrap_err());
    assert_eq!(err, DefaultError::NoElements { rule: 0 });

    let mut builder = list_builder(
        StoreKind::OrderedList,
        abc_schema(),
        vec![None, Some(json!({"a": 1}))],
    );
    let err = default_error(builder.declare_default(Some("0"), None, []).unwrap_err());
    assert!(matches!(err, DefaultError::KeyNotAllowed { rule: 0, .. }));

    // A leading placeholder cannot become a default
    let err = default_error(builder.declare_default(None, None, []).unwrap_err());
    assert!(matches!(err, DefaultError::EmptyDefault { rule: 0, .. }));
    assert_eq!(builder.build().len(), 2);
}

#[test]
fn test_unknown_ruleset() {
    let mut builder = map_builder(server_schema(), &[("d", json!({"port": 1}))]);

    let err = default_error(
        builder
            .declare_default(Some("d"), Some("missing"), [])
            .unwrap_err(),
    );
    assert_eq!(
        err,
        DefaultError::UnknownRuleset {
            rule: 0,
            ruleset: "missing".to_string()
        }
    );

    assert_eq!(builder.declare_default(Some("d"), Some("shallow"), []).unwrap(), 0);
    let store = builder.build();
    assert_eq!(store.rules()[0].ruleset(), "shallow");
    assert!(store.rules()[0].is_unconditional());
}

#[test]
fn test_condition_paths_checked_against_schema() {
    let schema = abc_schema();
    schema.set_fully_defined(true);
    let mut builder = map_builder(schema, &[("d1", json!({"a": 1})), ("d2", json!({"b": 1}))]);

    builder.declare_default(Some("d1"), None, []).unwrap();
    let err = default_error(
        builder
            .declare_default(Some("d2"), None, [Condition::eq("/z", 1)])
            .unwrap_err(),
    );
    assert!(matches!(err, DefaultError::InvalidConditionPath { rule: 1, .. }));
    assert_eq!(err.rule(), Some(1));
    assert!(std::error::Error::source(&err).is_some());

    // d2 is still an ordinary element
    let store = builder.build();
    assert!(store.exists(&crate::helpers::name("d2"), false));
}

#[test]
fn test_condition_syntax_errors() {
    let err = "/a<".parse::<Condition>().unwrap_err();
    assert!(matches!(err, DefaultError::InvalidCondition { .. }));
    assert_eq!(err.rule(), None);

    let condition: Condition = "/a>=3".parse().unwrap();
    assert_eq!(condition.to_string(), "/a>=3");
}
