//! Shift: copy matched input data to new locations
//!
//! Leaves name one or more write paths. Each match merges its data into a
//! fresh output document; several matches writing the same path produce a
//! list. A `null` right-hand side matches the key and writes nothing.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Transform;
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::output::OutputPath;
use crate::walker::{CompiledSpec, LeafPolicy, MatchContext, TargetContext, WriteDecision};
use serde_json::Value;

/// Leaf behaviour of a shift spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftPolicy;

impl LeafPolicy for ShiftPolicy {
    type Target = Vec<OutputPath>;

    const NAME: &'static str = "shift";

    fn compile_target(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<Self::Target, SpecError> {
        let root_key = &context.config().root_key;
        match rhs {
            Value::Null => Ok(Vec::new()),
            Value::String(path) => Ok(vec![OutputPath::parse(path, root_key)?]),
            Value::Array(paths) => paths
                .iter()
                .map(|path| match path {
                    Value::String(path) => OutputPath::parse(path, root_key),
                    other => Err(SpecError::invalid_value(
                        context.location(),
                        format!("shift targets must be strings, found {}", other),
                    )),
                })
                .collect(),
            other => Err(SpecError::invalid_value(
                context.location(),
                format!("a shift target must be a string, a list of strings or null, found {}", other),
            )),
        }
    }

    fn leaf_action<'t>(&self, target: &'t Self::Target, matched: &MatchContext<'_, '_>) -> WriteDecision<'t> {
        match matched.data() {
            Some(data) if !target.is_empty() => WriteDecision::Write {
                data: data.clone(),
                targets: target,
            },
            _ => WriteDecision::Skip,
        }
    }
}

/// A compiled shift spec
#[derive(Debug, PartialEq)]
pub struct Shift {
    spec: CompiledSpec<ShiftPolicy>,
}

impl Shift {
    /// Compile with the default configuration
    pub fn new(spec: &Value) -> Result<Self, SpecError> {
        Self::with_config(spec, &EngineConfig::default())
    }

    pub fn with_config(spec: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        Ok(Self {
            spec: CompiledSpec::compile(ShiftPolicy, spec, config)?,
        })
    }

    pub fn compiled(&self) -> &CompiledSpec<ShiftPolicy> {
        &self.spec
    }

    /// The shifted document, or null when nothing matched
    pub fn apply(&self, input: &Value) -> Value {
        self.spec.walk(input).into_output(self.spec.root_key())
    }
}

impl Transform for Shift {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}
