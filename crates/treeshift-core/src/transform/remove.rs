//! Remove: delete matched locations
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Transform;
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::path::PathElement;
use crate::walker::{CompiledSpec, LeafPolicy, MatchContext, TargetContext, WriteDecision};
use serde_json::Value;

/// Leaf behaviour of a remove spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovePolicy;

impl LeafPolicy for RemovePolicy {
    type Target = ();

    const NAME: &'static str = "remove";

    fn compile_target(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<Self::Target, SpecError> {
        match rhs {
            Value::Null => Ok(()),
            Value::String(text) if text.is_empty() => Ok(()),
            other => Err(SpecError::invalid_value(
                context.location(),
                format!("remove specs take \"\" or null at leaves, found {}", other),
            )),
        }
    }

    fn validate_element(&self, element: &PathElement, context: &TargetContext<'_>) -> Result<(), SpecError> {
        if element.is_special() {
            return Err(SpecError::invalid_key(
                element.canonical(),
                format!("{} keys are not supported in remove specs", element.kind()),
                None,
            )
            .at(context.location()));
        }
        Ok(())
    }

    fn leaf_action<'t>(&self, _target: &'t Self::Target, _matched: &MatchContext<'_, '_>) -> WriteDecision<'t> {
        WriteDecision::Remove
    }
}

/// A compiled remove spec
#[derive(Debug, PartialEq)]
pub struct Remove {
    spec: CompiledSpec<RemovePolicy>,
}

impl Remove {
    pub fn new(spec: &Value) -> Result<Self, SpecError> {
        Self::with_config(spec, &EngineConfig::default())
    }

    pub fn with_config(spec: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        Ok(Self {
            spec: CompiledSpec::compile(RemovePolicy, spec, config)?,
        })
    }

    pub fn compiled(&self) -> &CompiledSpec<RemovePolicy> {
        &self.spec
    }

    pub fn apply(&self, input: &Value) -> Value {
        self.spec.walk(input).apply_edits(input)
    }
}

impl Transform for Remove {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removes_keys_and_nested_keys() {
        let remove = Remove::new(&json!({"secret": "", "user": {"password": null}})).unwrap();
        let input = json!({"secret": 1, "keep": 2, "user": {"name": "n", "password": "p"}});
        assert_eq!(remove.apply(&input), json!({"keep": 2, "user": {"name": "n"}}));
    }

    #[test]
    fn test_list_indices_removed_highest_first() {
        let remove = Remove::new(&json!({"list": {"0": "", "2": ""}})).unwrap();
        let input = json!({"list": ["a", "b", "c", "d"]});
        assert_eq!(remove.apply(&input), json!({"list": ["b", "d"]}));
    }

    #[test]
    fn test_wildcards_inside_lists() {
        let remove = Remove::new(&json!({"rows": {"*": {"debug*": ""}}})).unwrap();
        let input = json!({"rows": [{"a": 1, "debugX": 2}, {"debugY": 3}]});
        assert_eq!(remove.apply(&input), json!({"rows": [{"a": 1}, {}]}));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let remove = Remove::new(&json!({"a": ""})).unwrap();
        let input = json!({"a": 1});
        let _ = remove.apply(&input);
        assert_eq!(input, json!({"a": 1}));
    }

    #[test]
    fn test_rejects_values_and_special_keys() {
        assert!(matches!(
            Remove::new(&json!({"a": "x"})).unwrap_err(),
            SpecError::InvalidValue { .. }
        ));
        assert!(matches!(
            Remove::new(&json!({"a": {"@": ""}})).unwrap_err(),
            SpecError::InvalidKey { .. }
        ));
    }
}
