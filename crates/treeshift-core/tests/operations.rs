//! Integration tests for the operations built on the walker
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use treeshift_core::{
    Cardinality, Chain, Defaults, EngineConfig, Error, FunctionRegistry, Modify, ModifyMode, Remove, Shift,
    SpecError, Transform,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[test]
fn defaults_fill_missing_and_null_values() {
    let defaults = Defaults::new(&json!({
        "name": "unknown",
        "settings": {"theme": "light", "size": 12},
        "tags[]": {"0": "first"},
        "rows": {"*": {"seen": false}}
    }))
    .unwrap();

    let input = json!({"name": null, "settings": {"theme": "dark"}, "rows": [{"seen": true}, {}]});
    assert_eq!(
        defaults.apply(&input),
        json!({
            "name": "unknown",
            "settings": {"theme": "dark", "size": 12},
            "tags": ["first"],
            "rows": [{"seen": true}, {"seen": false}]
        })
    );
}

#[test]
fn defaults_do_not_invent_wildcard_keys() {
    let defaults = Defaults::new(&json!({"*": {"active": true}})).unwrap();
    assert_eq!(defaults.apply(&json!({})), json!({}));
    assert_eq!(
        defaults.apply(&json!({"a": {}, "b": {"active": false}})),
        json!({"a": {"active": true}, "b": {"active": false}})
    );
}

#[test]
fn remove_deletes_matches_only() {
    let remove = Remove::new(&json!({"meta": {"debug*": ""}, "tmp": ""})).unwrap();
    let input = json!({"meta": {"debugA": 1, "version": 2}, "tmp": [1], "data": 3});
    assert_eq!(remove.apply(&input), json!({"meta": {"version": 2}, "data": 3}));
}

#[test]
fn modify_modes_differ_on_present_values() {
    let spec = json!({"count": "=toInteger", "label": "n/a"});
    let input = json!({"count": "42", "label": null});

    let overwrite = Modify::new(ModifyMode::Overwrite, &spec).unwrap();
    assert_eq!(overwrite.apply(&input), json!({"count": 42, "label": "n/a"}));

    let default = Modify::new(ModifyMode::Default, &spec).unwrap();
    assert_eq!(default.apply(&input), json!({"count": "42", "label": "n/a"}));

    let define = Modify::new(ModifyMode::Define, &spec).unwrap();
    assert_eq!(define.apply(&input), input);
}

#[test]
fn modify_reads_siblings_and_lists() {
    let modify = Modify::overwrite(&json!({
        "orders": {"*": {"total": "=multiply(@(1,price), @(1,qty))"}},
        "count": "=size(@(1,orders))"
    }))
    .unwrap();

    let input = json!({"orders": [{"price": 2, "qty": 3}, {"price": 5, "qty": 1}]});
    assert_eq!(
        modify.apply(&input),
        json!({
            "orders": [{"price": 2, "qty": 3, "total": 6}, {"price": 5, "qty": 1, "total": 5}],
            "count": 2
        })
    );
}

#[test]
fn modify_with_custom_registry() {
    fn shout(args: &[Value]) -> Option<Value> {
        args.first()?.as_str().map(|text| Value::String(format!("{}!", text.to_uppercase())))
    }

    let mut registry = FunctionRegistry::builtin();
    registry.register("shout", shout);
    let modify = Modify::with_registry(
        ModifyMode::Overwrite,
        &json!({"greeting": "=shout"}),
        Arc::new(registry),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(modify.apply(&json!({"greeting": "hi"})), json!({"greeting": "HI!"}));
    assert!(Modify::overwrite(&json!({"greeting": "=shout"})).is_err());
}

#[test]
fn cardinality_normalizes_both_ways() {
    let cardinality = Cardinality::new(&json!({"author": "ONE", "tags": "MANY"})).unwrap();
    assert_eq!(
        cardinality.apply(&json!({"author": ["a", "b"], "tags": "x"})),
        json!({"author": "a", "tags": ["x"]})
    );
}

#[test]
fn chain_pipeline() {
    init_logging();
    let chain = Chain::new(&json!([
        {"operation": "shift", "spec": {"user": {"first": "name.first", "last": "name.last", "roles": "roles"}}},
        {"operation": "modify-overwrite-beta", "spec": {"name": {"full": "=concat(@(1,first), ' ', @(1,last))"}}},
        {"operation": "cardinality", "spec": {"roles": "MANY"}},
        {"operation": "default", "spec": {"active": true}},
        {"operation": "remove", "spec": {"name": {"first": "", "last": ""}}}
    ]))
    .unwrap();

    let input = json!({"user": {"first": "Ada", "last": "Lovelace", "roles": "admin"}});
    assert_eq!(
        chain.transform(&input),
        json!({"name": {"full": "Ada Lovelace"}, "roles": ["admin"], "active": true})
    );
}

#[test]
fn chain_reports_failing_step() {
    let err = Chain::new(&json!([
        {"operation": "default", "spec": {"a": 1}},
        {"operation": "shift", "spec": {"a": {"@": {"b": "c"}}}}
    ]))
    .unwrap_err();

    match err {
        Error::ChainStep { index, operation, source } => {
            assert_eq!(index, 1);
            assert_eq!(operation, "shift");
            assert!(matches!(source, SpecError::SpecialWithChildren { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn compiled_specs_are_shared_across_threads() {
    let shift = Arc::new(Shift::new(&json!({"*": "out.&"})).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shift = Arc::clone(&shift);
            thread::spawn(move || shift.apply(&json!({ "k": i })))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), json!({"out": {"k": i}}));
    }
}

#[test]
fn transform_as_decodes_typed_output() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    let shift = Shift::new(&json!({"n": "name", "a": "age"})).unwrap();
    let person: Person = shift.transform_as(&json!({"n": "Grace", "a": 85})).unwrap();
    assert_eq!(person, Person { name: "Grace".into(), age: 85 });

    let err = shift.transform_as::<Person>(&json!({"n": "Grace"})).unwrap_err();
    assert!(matches!(err, Error::Json { .. }));
}

#[test]
fn oversized_list_indexes_never_panic() {
    let shift = Shift::new(&json!({"*": "out[&0]"})).unwrap();
    assert_eq!(shift.apply(&json!({"18446744073709551615": 1, "4000000000": 2, "1": 3})), json!({"out": [null, 3]}));

    let err = Shift::new(&json!({"a": "out[18446744073709551615]"})).unwrap_err();
    assert!(matches!(err, SpecError::InvalidWritePath { .. }));

    let err = Defaults::new(&json!({"l[]": {"18446744073709551615": 1}})).unwrap_err();
    assert!(matches!(err, SpecError::InvalidArrayKey { .. }));

    let defaults = Defaults::new(&json!({"l": {"5000000000": 1, "1": 2}})).unwrap();
    assert_eq!(defaults.apply(&json!({"l": []})), json!({"l": [null, 2]}));
}

#[test]
fn huge_pad_widths_skip_the_write() {
    let modify = Modify::overwrite(&json!({"code": "=leftPad(@, 1000000000000, 'x')"})).unwrap();
    assert_eq!(modify.apply(&json!({"code": "7"})), json!({"code": "7"}));
}

#[test]
fn spec_errors_name_key_and_location() {
    let err = Shift::new(&json!({"rating": {"a*&": "x"}})).unwrap_err();
    assert_eq!(err.location(), Some("rating.a*&"));
    assert!(err.detailed_message().contains('^'));

    let err = Shift::new(&json!({"a": "b..c"})).unwrap_err();
    assert!(matches!(err, SpecError::InvalidWritePath { .. }));

    let err = Shift::new(&json!({"a|b": "x", "b": "y"})).unwrap_err();
    assert!(matches!(err, SpecError::DuplicateKey { .. }));
}
