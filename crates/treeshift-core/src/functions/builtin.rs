//! Built-in functions
//!
//! Argument conventions: list arguments are flattened where a function
//! works on "all values" (`concat`, `min`, `intSum`, ...); numbers may be
//! given as numeric strings; anything of the wrong type yields `None`.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Function;
use regex::Regex;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Every built-in, by the name specs call it with
pub const BUILTINS: &[(&str, Function)] = &[
    // strings
    ("toLower", to_lower),
    ("toUpper", to_upper),
    ("trim", trim),
    ("concat", concat),
    ("join", join),
    ("split", split),
    ("substring", substring),
    ("leftPad", left_pad),
    ("rightPad", right_pad),
    ("toString", to_string),
    // numbers
    ("abs", abs),
    ("min", min),
    ("max", max),
    ("avg", avg),
    ("intSum", int_sum),
    ("doubleSum", double_sum),
    ("toInteger", to_integer),
    ("toDouble", to_double),
    ("toBoolean", to_boolean),
    ("divide", divide),
    ("multiply", multiply),
    // lists
    ("size", size),
    ("firstElement", first_element),
    ("lastElement", last_element),
    ("elementAt", element_at),
    ("toList", to_list),
    ("squashNulls", squash_nulls),
    ("sort", sort),
    // predicates
    ("isPresent", is_present),
    ("notNull", not_null),
    ("isNull", is_null),
];

fn first(args: &[Value]) -> Option<&Value> {
    args.first()
}

fn first_str(args: &[Value]) -> Option<&str> {
    first(args)?.as_str()
}

/// Lists are expanded one level; nulls are dropped
fn flatten(args: &[Value]) -> Vec<&Value> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => values.extend(items.iter().filter(|item| !item.is_null())),
            Value::Null => {}
            other => values.push(other),
        }
    }
    values
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn as_index(value: &Value) -> Option<usize> {
    as_i64(value).and_then(|index| usize::try_from(index).ok())
}

fn float(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

fn to_lower(args: &[Value]) -> Option<Value> {
    Some(Value::String(first_str(args)?.to_lowercase()))
}

fn to_upper(args: &[Value]) -> Option<Value> {
    Some(Value::String(first_str(args)?.to_uppercase()))
}

fn trim(args: &[Value]) -> Option<Value> {
    Some(Value::String(first_str(args)?.trim().to_string()))
}

fn concat(args: &[Value]) -> Option<Value> {
    Some(Value::String(flatten(args).into_iter().map(render).collect()))
}

/// `join(separator, values...)`
fn join(args: &[Value]) -> Option<Value> {
    let (separator, rest) = args.split_first()?;
    let separator = separator.as_str()?;
    let parts: Vec<String> = flatten(rest).into_iter().map(render).collect();
    Some(Value::String(parts.join(separator)))
}

/// `split(pattern, text)`; the pattern is a regular expression
fn split(args: &[Value]) -> Option<Value> {
    let pattern = args.first()?.as_str()?;
    let text = args.get(1)?.as_str()?;
    let regex = Regex::new(pattern).ok()?;
    Some(Value::Array(
        regex
            .split(text)
            .map(|part| Value::String(part.to_string()))
            .collect(),
    ))
}

/// `substring(text, start, end)` over characters, end exclusive
fn substring(args: &[Value]) -> Option<Value> {
    let text = first_str(args)?;
    let start = as_index(args.get(1)?)?;
    let end = as_index(args.get(2)?)?;
    let chars: Vec<char> = text.chars().collect();
    if start > end || end > chars.len() {
        return None;
    }
    Some(Value::String(chars[start..end].iter().collect()))
}

/// Widest result `leftPad`/`rightPad` will build
const MAX_PAD_WIDTH: usize = 10_000;

fn pad(args: &[Value], left: bool) -> Option<Value> {
    let text = first_str(args)?;
    let width = as_index(args.get(1)?)?;
    if width > MAX_PAD_WIDTH {
        return None;
    }
    let fill = args.get(2)?.as_str()?.chars().next()?;
    let missing = width.saturating_sub(text.chars().count());
    let padding: String = std::iter::repeat(fill).take(missing).collect();
    Some(Value::String(if left {
        format!("{}{}", padding, text)
    } else {
        format!("{}{}", text, padding)
    }))
}

/// `leftPad(text, width, fill)`
fn left_pad(args: &[Value]) -> Option<Value> {
    pad(args, true)
}

/// `rightPad(text, width, fill)`
fn right_pad(args: &[Value]) -> Option<Value> {
    pad(args, false)
}

fn to_string(args: &[Value]) -> Option<Value> {
    Some(Value::String(render(first(args)?)))
}

fn abs(args: &[Value]) -> Option<Value> {
    let value = first(args)?;
    match value {
        Value::Number(number) if number.is_i64() => Some(Value::from(number.as_i64()?.checked_abs()?)),
        Value::Number(number) if number.is_u64() => Some(value.clone()),
        other => float(as_f64(other)?.abs()),
    }
}

fn extreme(args: &[Value], wanted: Ordering) -> Option<Value> {
    let mut best: Option<(&Value, f64)> = None;
    for value in flatten(args) {
        let number = as_f64(value)?;
        match best {
            Some((_, current)) if number.partial_cmp(&current) != Some(wanted) => {}
            _ => best = Some((value, number)),
        }
    }
    best.map(|(value, _)| value.clone())
}

fn min(args: &[Value]) -> Option<Value> {
    extreme(args, Ordering::Less)
}

fn max(args: &[Value]) -> Option<Value> {
    extreme(args, Ordering::Greater)
}

fn avg(args: &[Value]) -> Option<Value> {
    let values = flatten(args);
    if values.is_empty() {
        return None;
    }
    let total = values.iter().map(|value| as_f64(value)).sum::<Option<f64>>()?;
    float(total / values.len() as f64)
}

fn int_sum(args: &[Value]) -> Option<Value> {
    let mut total: i64 = 0;
    for value in flatten(args) {
        total = total.checked_add(as_i64(value)?)?;
    }
    Some(Value::from(total))
}

fn double_sum(args: &[Value]) -> Option<Value> {
    float(flatten(args).into_iter().map(as_f64).sum::<Option<f64>>()?)
}

fn to_integer(args: &[Value]) -> Option<Value> {
    as_i64(first(args)?).map(Value::from)
}

fn to_double(args: &[Value]) -> Option<Value> {
    float(as_f64(first(args)?)?)
}

fn to_boolean(args: &[Value]) -> Option<Value> {
    match first(args)? {
        Value::Bool(flag) => Some(Value::Bool(*flag)),
        Value::String(text) if text.trim().eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        Value::String(text) if text.trim().eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        _ => None,
    }
}

/// `divide(numerator, denominator)`
fn divide(args: &[Value]) -> Option<Value> {
    let numerator = as_f64(args.first()?)?;
    let denominator = as_f64(args.get(1)?)?;
    if denominator == 0.0 {
        return None;
    }
    float(numerator / denominator)
}

fn multiply(args: &[Value]) -> Option<Value> {
    let values = flatten(args);
    if values.is_empty() {
        return None;
    }
    let all_integers = values
        .iter()
        .all(|value| matches!(value, Value::Number(number) if number.is_i64()));
    if all_integers {
        let mut product: i64 = 1;
        for value in &values {
            product = product.checked_mul(value.as_i64()?)?;
        }
        return Some(Value::from(product));
    }
    float(values.into_iter().map(as_f64).product::<Option<f64>>()?)
}

fn size(args: &[Value]) -> Option<Value> {
    let size = match first(args)? {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(text) => text.chars().count(),
        _ => return None,
    };
    Some(Value::from(size))
}

fn first_element(args: &[Value]) -> Option<Value> {
    first(args)?.as_array()?.first().cloned()
}

fn last_element(args: &[Value]) -> Option<Value> {
    first(args)?.as_array()?.last().cloned()
}

/// `elementAt(list, index)`
fn element_at(args: &[Value]) -> Option<Value> {
    let items = args.first()?.as_array()?;
    items.get(as_index(args.get(1)?)?).cloned()
}

fn to_list(args: &[Value]) -> Option<Value> {
    match first(args)? {
        Value::Array(items) => Some(Value::Array(items.clone())),
        Value::Null => Some(Value::Array(Vec::new())),
        other => Some(Value::Array(vec![other.clone()])),
    }
}

/// Drop nulls from a list or null-valued entries from a map
fn squash_nulls(args: &[Value]) -> Option<Value> {
    match first(args)? {
        Value::Array(items) => Some(Value::Array(items.iter().filter(|item| !item.is_null()).cloned().collect())),
        Value::Object(map) => Some(Value::Object(
            map.iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )),
        _ => None,
    }
}

/// Sort a list of all numbers or all strings
fn sort(args: &[Value]) -> Option<Value> {
    let mut items = first(args)?.as_array()?.clone();
    if items.iter().all(Value::is_number) {
        let mut keyed: Vec<(f64, Value)> = items
            .into_iter()
            .map(|item| (item.as_f64().unwrap_or_default(), item))
            .collect();
        keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        return Some(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()));
    }
    if items.iter().all(Value::is_string) {
        items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        return Some(Value::Array(items));
    }
    None
}

fn is_present(args: &[Value]) -> Option<Value> {
    first(args).cloned()
}

fn not_null(args: &[Value]) -> Option<Value> {
    first(args).filter(|value| !value.is_null()).cloned()
}

fn is_null(args: &[Value]) -> Option<Value> {
    first(args).filter(|value| value.is_null()).cloned()
}
