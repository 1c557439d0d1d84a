//! Cardinality: force values to a single element or to a list
//!
//! `"ONE"` replaces a list by its first element (an empty list becomes
//! null); `"MANY"` wraps a single value in a list. `@` applies the rule to
//! the enclosing location.
//!
//! Nested keys are matched against the input as it was before any
//! normalization, so a spec that changes a level and also descends into it
//! sees the original shape below that level.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Transform;
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::path::PathElement;
use crate::walker::{CompiledSpec, LeafPolicy, MatchContext, TargetContext, WriteDecision};
use serde_json::Value;

/// Target shape of a cardinality leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    Many,
}

impl Multiplicity {
    /// The normalized value, or `None` when it already has the right shape
    pub fn normalize(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Multiplicity::One, Value::Array(list)) => Some(list.first().cloned().unwrap_or(Value::Null)),
            (Multiplicity::One, _) => None,
            (Multiplicity::Many, Value::Array(_) | Value::Null) => None,
            (Multiplicity::Many, other) => Some(Value::Array(vec![other.clone()])),
        }
    }
}

/// Leaf behaviour of a cardinality spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardinalityPolicy;

impl LeafPolicy for CardinalityPolicy {
    type Target = Multiplicity;

    const NAME: &'static str = "cardinality";

    fn compile_target(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<Self::Target, SpecError> {
        match rhs.as_str().map(str::to_ascii_uppercase).as_deref() {
            Some("ONE") => Ok(Multiplicity::One),
            Some("MANY") => Ok(Multiplicity::Many),
            _ => Err(SpecError::invalid_value(
                context.location(),
                format!("cardinality must be \"ONE\" or \"MANY\", found {}", rhs),
            )),
        }
    }

    fn validate_element(&self, element: &PathElement, context: &TargetContext<'_>) -> Result<(), SpecError> {
        match element {
            PathElement::At => Ok(()),
            other if other.is_special() => Err(SpecError::invalid_key(
                other.canonical(),
                format!("{} keys are not supported in cardinality specs", other.kind()),
                None,
            )
            .at(context.location())),
            _ => Ok(()),
        }
    }

    fn leaf_action<'t>(&self, target: &'t Self::Target, matched: &MatchContext<'_, '_>) -> WriteDecision<'t> {
        matched
            .data()
            .and_then(|value| target.normalize(value))
            .map(WriteDecision::Replace)
            .unwrap_or(WriteDecision::Skip)
    }
}

/// A compiled cardinality spec
#[derive(Debug, PartialEq)]
pub struct Cardinality {
    spec: CompiledSpec<CardinalityPolicy>,
}

impl Cardinality {
    pub fn new(spec: &Value) -> Result<Self, SpecError> {
        Self::with_config(spec, &EngineConfig::default())
    }

    pub fn with_config(spec: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        Ok(Self {
            spec: CompiledSpec::compile(CardinalityPolicy, spec, config)?,
        })
    }

    pub fn compiled(&self) -> &CompiledSpec<CardinalityPolicy> {
        &self.spec
    }

    pub fn apply(&self, input: &Value) -> Value {
        self.spec.walk(input).apply_edits(input)
    }
}

impl Transform for Cardinality {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_rules() {
        assert_eq!(Multiplicity::One.normalize(&json!([1, 2])), Some(json!(1)));
        assert_eq!(Multiplicity::One.normalize(&json!([])), Some(Value::Null));
        assert_eq!(Multiplicity::One.normalize(&json!(1)), None);
        assert_eq!(Multiplicity::Many.normalize(&json!("a")), Some(json!(["a"])));
        assert_eq!(Multiplicity::Many.normalize(&Value::Null), None);
        assert_eq!(Multiplicity::Many.normalize(&json!([1])), None);
    }

    #[test]
    fn test_applies_to_matched_keys() {
        let cardinality = Cardinality::new(&json!({"ids": "MANY", "name": "ONE", "*-list": "one"})).unwrap();
        let input = json!({"ids": 4, "name": ["a", "b"], "x-list": [], "other": [1]});
        assert_eq!(
            cardinality.apply(&input),
            json!({"ids": [4], "name": "a", "x-list": null, "other": [1]})
        );
    }

    #[test]
    fn test_at_targets_enclosing_location() {
        let cardinality = Cardinality::new(&json!({"photo": {"@": "ONE"}})).unwrap();
        let input = json!({"photo": [{"url": "a"}, {"url": "b"}]});
        assert_eq!(cardinality.apply(&input), json!({"photo": {"url": "a"}}));
    }

    #[test]
    fn test_rejects_unknown_value() {
        let err = Cardinality::new(&json!({"a": "SOME"})).unwrap_err();
        assert_eq!(err.location(), Some("a"));
    }
}
