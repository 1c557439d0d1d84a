//! Generic get/set/remove over `serde_json::Value` trees
//!
//! Paths are sequences of concrete [`PathStep`]s. Writers create missing
//! intermediate containers: a list when the following step is an index, a
//! map otherwise. A `null` in the middle of a path is replaced by the
//! container the next step needs; any other type mismatch makes the write a
//! no-op. So does an index above [`MAX_LIST_INDEX`].
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use serde_json::{Map, Value};

/// Largest list index a write may pad a list out to
pub const MAX_LIST_INDEX: usize = 1_000_000;

/// One resolved step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Key(String),
    Index(usize),
    /// `[]`: a new element at the end of a list
    Append,
}

impl PathStep {
    fn empty_container(&self) -> Value {
        match self {
            PathStep::Key(_) => Value::Object(Map::new()),
            PathStep::Index(_) | PathStep::Append => Value::Array(Vec::new()),
        }
    }
}

/// Read the value at `steps`
pub fn get<'v>(tree: &'v Value, steps: &[PathStep]) -> Option<&'v Value> {
    steps.iter().try_fold(tree, |current, step| match (current, step) {
        (Value::Object(map), PathStep::Key(key)) => map.get(key),
        (Value::Array(list), PathStep::Index(index)) => list.get(*index),
        (Value::Array(list), PathStep::Key(key)) => key.parse::<usize>().ok().and_then(|index| list.get(index)),
        _ => None,
    })
}

/// Walk to the parent of the last step, creating containers on the way
fn parent_mut<'v>(tree: &'v mut Value, steps: &[PathStep]) -> Option<&'v mut Value> {
    let mut current = tree;
    for pair in steps.windows(2) {
        current = child_mut(current, &pair[0], &pair[1])?;
    }
    Some(current)
}

/// Descend one step, creating the child container `next` needs if missing
fn child_mut<'v>(current: &'v mut Value, step: &PathStep, next: &PathStep) -> Option<&'v mut Value> {
    if current.is_null() {
        *current = step.empty_container();
    }
    let child = match (current, step) {
        (Value::Object(map), PathStep::Key(key)) => map.entry(key.clone()).or_insert(Value::Null),
        (Value::Array(list), PathStep::Index(index)) => list_slot(list, *index)?,
        (Value::Array(list), PathStep::Append) => {
            list.push(Value::Null);
            list.last_mut()?
        }
        _ => return None,
    };
    if child.is_null() {
        *child = next.empty_container();
    }
    let fits = matches!(
        (&*child, next),
        (Value::Object(_), PathStep::Key(_)) | (Value::Array(_), PathStep::Index(_) | PathStep::Append)
    );
    fits.then_some(child)
}

/// Fan-in write: absent or null is set, a list is appended to, and a single
/// value becomes `[old, new]`
///
/// Returns `false` when a type mismatch prevented the write.
pub fn write_merged(tree: &mut Value, steps: &[PathStep], value: Value) -> bool {
    let Some(last) = steps.last() else {
        merge_into(tree, value);
        return true;
    };
    let Some(parent) = parent_mut(tree, steps) else {
        return false;
    };
    if parent.is_null() {
        *parent = last.empty_container();
    }

    match (parent, last) {
        (Value::Object(map), PathStep::Key(key)) => {
            merge_into(map.entry(key.clone()).or_insert(Value::Null), value);
            true
        }
        (Value::Array(list), PathStep::Index(index)) => match list_slot(list, *index) {
            Some(slot) => {
                merge_into(slot, value);
                true
            }
            None => false,
        },
        (Value::Array(list), PathStep::Append) => {
            list.push(value);
            true
        }
        _ => false,
    }
}

/// The element at `index`, padding the list with nulls up to it
fn list_slot(list: &mut Vec<Value>, index: usize) -> Option<&mut Value> {
    if index > MAX_LIST_INDEX {
        return None;
    }
    if list.len() <= index {
        list.resize(index + 1, Value::Null);
    }
    list.get_mut(index)
}

fn merge_into(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(list) => list.push(value),
        existing => {
            let old = existing.take();
            *existing = Value::Array(vec![old, value]);
        }
    }
}

/// Overwrite the value at `steps`; an empty path replaces the whole tree
pub fn set(tree: &mut Value, steps: &[PathStep], value: Value) -> bool {
    let Some(last) = steps.last() else {
        *tree = value;
        return true;
    };
    let Some(parent) = parent_mut(tree, steps) else {
        return false;
    };
    if parent.is_null() {
        *parent = last.empty_container();
    }

    match (parent, last) {
        (Value::Object(map), PathStep::Key(key)) => {
            map.insert(key.clone(), value);
            true
        }
        (Value::Array(list), PathStep::Index(index)) => match list_slot(list, *index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        (Value::Array(list), PathStep::Append) => {
            list.push(value);
            true
        }
        _ => false,
    }
}

/// Remove and return the value at `steps`; list elements shift left
pub fn remove(tree: &mut Value, steps: &[PathStep]) -> Option<Value> {
    let (last, parents) = steps.split_last()?;
    let mut current = tree;
    for step in parents {
        current = match (current, step) {
            (Value::Object(map), PathStep::Key(key)) => map.get_mut(key)?,
            (Value::Array(list), PathStep::Index(index)) => list.get_mut(*index)?,
            _ => return None,
        };
    }

    match (current, last) {
        (Value::Object(map), PathStep::Key(key)) => map.remove(key),
        (Value::Array(list), PathStep::Index(index)) if *index < list.len() => Some(list.remove(*index)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> PathStep {
        PathStep::Key(k.to_string())
    }

    #[test]
    fn test_write_creates_maps_and_lists() {
        let mut tree = json!({});
        assert!(write_merged(&mut tree, &[key("a"), PathStep::Index(2), key("b")], json!(1)));
        assert_eq!(tree, json!({"a": [null, null, {"b": 1}]}));
    }

    #[test]
    fn test_write_merges_fan_in() {
        let mut tree = json!({});
        write_merged(&mut tree, &[key("z")], json!(1));
        write_merged(&mut tree, &[key("z")], json!(2));
        write_merged(&mut tree, &[key("z")], json!(3));
        assert_eq!(tree, json!({"z": [1, 2, 3]}));
    }

    #[test]
    fn test_write_into_existing_list_appends() {
        let mut tree = json!({"z": [1]});
        write_merged(&mut tree, &[key("z")], json!([2]));
        assert_eq!(tree, json!({"z": [1, [2]]}));
    }

    #[test]
    fn test_write_append_step() {
        let mut tree = json!({});
        write_merged(&mut tree, &[key("list"), PathStep::Append], json!("a"));
        write_merged(&mut tree, &[key("list"), PathStep::Append, key("x")], json!("b"));
        assert_eq!(tree, json!({"list": ["a", {"x": "b"}]}));
    }

    #[test]
    fn test_type_mismatch_skips_write() {
        let mut tree = json!({"a": 5});
        assert!(!write_merged(&mut tree, &[key("a"), key("b")], json!(1)));
        assert!(!write_merged(&mut tree, &[key("a"), PathStep::Index(0)], json!(1)));
        assert_eq!(tree, json!({"a": 5}));
    }

    #[test]
    fn test_oversized_index_skips_write() {
        let mut tree = json!({});
        assert!(!write_merged(&mut tree, &[key("a"), PathStep::Index(usize::MAX)], json!(1)));
        assert!(!set(&mut tree, &[key("a"), PathStep::Index(MAX_LIST_INDEX + 1)], json!(1)));
        assert!(!write_merged(&mut tree, &[key("b"), PathStep::Index(usize::MAX), key("c")], json!(1)));
        assert!(set(&mut tree, &[key("c"), PathStep::Index(2)], json!(1)));
        assert_eq!(tree["c"], json!([null, null, 1]));
        assert!(tree["a"].as_array().map_or(true, Vec::is_empty));
    }

    #[test]
    fn test_set_replaces_null_intermediates() {
        let mut tree = json!({"a": null});
        assert!(set(&mut tree, &[key("a"), key("b")], json!(true)));
        assert_eq!(tree, json!({"a": {"b": true}}));

        assert!(set(&mut tree, &[], json!([1])));
        assert_eq!(tree, json!([1]));
    }

    #[test]
    fn test_get_reads_list_by_numeric_key() {
        let tree = json!({"a": [{"b": 1}, {"b": 2}]});
        assert_eq!(get(&tree, &[key("a"), key("1"), key("b")]), Some(&json!(2)));
        assert_eq!(get(&tree, &[key("a"), PathStep::Index(5)]), None);
        assert_eq!(get(&tree, &[]), Some(&tree));
    }

    #[test]
    fn test_remove_from_maps_and_lists() {
        let mut tree = json!({"a": [1, 2, 3], "b": {"c": 1}});
        assert_eq!(remove(&mut tree, &[key("a"), PathStep::Index(1)]), Some(json!(2)));
        assert_eq!(remove(&mut tree, &[key("b"), key("c")]), Some(json!(1)));
        assert_eq!(remove(&mut tree, &[key("missing")]), None);
        assert_eq!(tree, json!({"a": [1, 3], "b": {}}));
    }
}
