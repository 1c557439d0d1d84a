//! Defaults: fill in values that are missing or null
//!
//! Literal keys absent from the input are created along with any containers
//! above them; a composite key written as `name[]` creates a list and takes
//! integer keys. Wildcard keys only apply to keys the input already has.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Transform;
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::path::PathElement;
use crate::walker::{CompiledSpec, LeafPolicy, MatchContext, TargetContext, WriteDecision};
use serde_json::Value;

/// Leaf behaviour of a defaults spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultsPolicy;

impl LeafPolicy for DefaultsPolicy {
    type Target = Value;

    const NAME: &'static str = "default";

    fn compile_target(&self, rhs: &Value, _context: &TargetContext<'_>) -> Result<Self::Target, SpecError> {
        Ok(rhs.clone())
    }

    fn validate_element(&self, element: &PathElement, context: &TargetContext<'_>) -> Result<(), SpecError> {
        match element {
            PathElement::Literal(_) => Ok(()),
            element if element.is_star() => Ok(()),
            other => Err(SpecError::invalid_key(
                other.canonical(),
                format!("{} keys are not supported in default specs", other.kind()),
                None,
            )
            .at(context.location())),
        }
    }

    fn visits_missing(&self) -> bool {
        true
    }

    fn leaf_action<'t>(&self, target: &'t Self::Target, matched: &MatchContext<'_, '_>) -> WriteDecision<'t> {
        match matched.data() {
            None | Some(Value::Null) => WriteDecision::Replace(target.clone()),
            Some(_) => WriteDecision::Skip,
        }
    }
}

/// A compiled defaults spec
#[derive(Debug, PartialEq)]
pub struct Defaults {
    spec: CompiledSpec<DefaultsPolicy>,
}

impl Defaults {
    pub fn new(spec: &Value) -> Result<Self, SpecError> {
        Self::with_config(spec, &EngineConfig::default())
    }

    pub fn with_config(spec: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        Ok(Self {
            spec: CompiledSpec::compile(DefaultsPolicy, spec, config)?,
        })
    }

    pub fn compiled(&self) -> &CompiledSpec<DefaultsPolicy> {
        &self.spec
    }

    pub fn apply(&self, input: &Value) -> Value {
        self.spec.walk(input).apply_edits(input)
    }
}

impl Transform for Defaults {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}
