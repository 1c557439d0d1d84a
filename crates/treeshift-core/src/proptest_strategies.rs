//! Property-based testing strategies for generating test data
//!
//! Random JSON documents, spec keys and small but valid shift specs.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

#![cfg(test)]

use crate::transform::Shift;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Plain input keys without special characters
pub fn plain_key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,7}"
}

/// Spec keys drawn from every key form, valid or not
pub fn spec_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        plain_key_strategy(),
        Just("*".to_string()),
        "[a-z]{1,3}\\*[a-z]{0,3}",
        "[a-z]{1,3}\\*[a-z]{1,3}\\*",
        Just("&".to_string()),
        "&[0-3]",
        "&\\([0-3],[0-2]\\)",
        "\\$[0-2]?",
        Just("@".to_string()),
        "#[0-3]?",
        "@\\([0-2],[a-z]{1,4}\\)",
        "[a-z]{1,3}\\|[a-z]{1,3}",
        "[a-z&*$#@|()\\[\\]\\\\.]{1,8}",
    ]
}

/// Scalar JSON values
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::String),
    ]
}

/// Nested JSON documents of bounded size
pub fn json_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..5).prop_map(Value::Array),
            btree_map(plain_key_strategy(), inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Write paths made of plain keys and references
pub fn write_path_strategy() -> impl Strategy<Value = String> {
    vec(
        prop_oneof![plain_key_strategy(), Just("&".to_string()), "&[0-2]", "[a-z]{1,3}\\[#[1-2]\\]"],
        1..4,
    )
    .prop_map(|segments| segments.join("."))
}

/// Shift specs that always compile
pub fn shift_spec_strategy() -> impl Strategy<Value = Value> {
    let leaf = write_path_strategy().prop_map(Value::String);
    leaf.prop_recursive(3, 24, 4, |inner| {
        btree_map(
            prop_oneof![plain_key_strategy(), Just("*".to_string()), "[a-z]{1,3}\\*"],
            inner,
            1..4,
        )
        .prop_map(|map| Value::Object(map.into_iter().collect()))
    })
    .prop_filter("spec root must be an object that compiles", |spec| {
        spec.is_object() && Shift::new(spec).is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathElement;
    use crate::spec::ExecutionStrategy;
    use serde_json::json;

    proptest! {
        #[test]
        fn key_parsing_never_panics(key in spec_key_strategy()) {
            let _ = PathElement::parse(&key);
        }

        #[test]
        fn compile_is_idempotent(spec in shift_spec_strategy()) {
            let first = Shift::new(&spec).unwrap();
            let second = Shift::new(&spec).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn apply_is_deterministic(spec in shift_spec_strategy(), input in json_strategy()) {
            let shift = Shift::new(&spec).unwrap();
            prop_assert_eq!(shift.apply(&input), shift.apply(&input));
        }

        #[test]
        fn apply_never_mutates_input(spec in shift_spec_strategy(), input in json_strategy()) {
            let shift = Shift::new(&spec).unwrap();
            let before = input.clone();
            let _ = shift.apply(&input);
            prop_assert_eq!(before, input);
        }

        #[test]
        fn identity_spec_copies_objects(
            map in btree_map(plain_key_strategy(), scalar_strategy(), 1..6)
        ) {
            let input = Value::Object(map.into_iter().collect());
            let shift = Shift::new(&serde_json::json!({"*": "&"})).unwrap();
            prop_assert_eq!(shift.apply(&input), input);
        }

        #[test]
        fn conflict_search_does_not_change_output(
            map in btree_map("a[0-9]{1,2}|b", scalar_strategy(), 0..8)
        ) {
            let input = Value::Object(map.into_iter().map(|(key, v)| (key, json!({"v": v}))).collect());
            let leaf = json!({"v": ["out[#2]", "all.&1"], "$": "keys[]"});
            let no_conflict = Shift::new(&json!({"b": leaf.clone(), "a*": leaf.clone()})).unwrap();
            let conflict = Shift::new(&json!({"b": leaf.clone(), "a*": leaf, "*": null})).unwrap();

            prop_assert_eq!(no_conflict.compiled().root().strategy, ExecutionStrategy::NoConflict);
            prop_assert_eq!(conflict.compiled().root().strategy, ExecutionStrategy::Conflict);
            prop_assert_eq!(no_conflict.apply(&input), conflict.apply(&input));
        }

        #[test]
        fn stats_count_every_leaf(spec in shift_spec_strategy()) {
            let shift = Shift::new(&spec).unwrap();
            prop_assert!(shift.compiled().stats().leaves >= 1);
        }
    }
}
