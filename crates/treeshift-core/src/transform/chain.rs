//! Chain: several operations applied in sequence
//!
//! A chain spec is a list of entries:
//!
//! ```json
//! [
//!   { "operation": "shift", "spec": { "rating": "score" } },
//!   { "operation": "default", "spec": { "score": 0 } }
//! ]
//! ```
//!
//! Every entry is compiled up front, so a bad entry fails the whole chain
//! before any input is seen.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::{Cardinality, Defaults, Modify, ModifyMode, Remove, Shift, Transform};
use crate::config::EngineConfig;
use crate::error::{Error, Result, SpecError};
use crate::functions::FunctionRegistry;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// Operation names accepted in chain entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Shift,
    Default,
    Remove,
    ModifyOverwrite,
    ModifyDefault,
    ModifyDefine,
    Cardinality,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Shift,
        OperationKind::Default,
        OperationKind::Remove,
        OperationKind::ModifyOverwrite,
        OperationKind::ModifyDefault,
        OperationKind::ModifyDefine,
        OperationKind::Cardinality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Shift => "shift",
            OperationKind::Default => "default",
            OperationKind::Remove => "remove",
            OperationKind::ModifyOverwrite => "modify-overwrite",
            OperationKind::ModifyDefault => "modify-default",
            OperationKind::ModifyDefine => "modify-define",
            OperationKind::Cardinality => "cardinality",
        }
    }

    /// Resolve a name, accepting the deprecated `-beta` spellings
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(kind) = Self::ALL.into_iter().find(|kind| kind.name() == name) {
            return Some(kind);
        }
        let kind = Self::ALL
            .into_iter()
            .find(|kind| name.strip_suffix("-beta") == Some(kind.name()))?;
        log::warn!("Operation '{}' is deprecated, use '{}' instead", name, kind.name());
        Some(kind)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = SpecError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(name).ok_or_else(|| SpecError::InvalidChain {
            index: 0,
            message: format!("unknown operation '{}'", name),
        })
    }
}

/// One compiled chain entry
#[derive(Debug, PartialEq)]
enum Stage {
    Shift(Shift),
    Default(Defaults),
    Remove(Remove),
    Modify(Modify),
    Cardinality(Cardinality),
}

impl Stage {
    fn compile(
        kind: OperationKind,
        spec: &Value,
        config: &EngineConfig,
        registry: &Arc<FunctionRegistry>,
    ) -> std::result::Result<Self, SpecError> {
        let modify = |mode| Modify::with_registry(mode, spec, Arc::clone(registry), config).map(Stage::Modify);
        match kind {
            OperationKind::Shift => Shift::with_config(spec, config).map(Stage::Shift),
            OperationKind::Default => Defaults::with_config(spec, config).map(Stage::Default),
            OperationKind::Remove => Remove::with_config(spec, config).map(Stage::Remove),
            OperationKind::ModifyOverwrite => modify(ModifyMode::Overwrite),
            OperationKind::ModifyDefault => modify(ModifyMode::Default),
            OperationKind::ModifyDefine => modify(ModifyMode::Define),
            OperationKind::Cardinality => Cardinality::with_config(spec, config).map(Stage::Cardinality),
        }
    }

    fn transform(&self) -> &dyn Transform {
        match self {
            Stage::Shift(shift) => shift,
            Stage::Default(defaults) => defaults,
            Stage::Remove(remove) => remove,
            Stage::Modify(modify) => modify,
            Stage::Cardinality(cardinality) => cardinality,
        }
    }
}

/// A compiled list of operations
#[derive(Debug, PartialEq)]
pub struct Chain {
    stages: Vec<(OperationKind, Stage)>,
}

impl Chain {
    pub fn new(spec: &Value) -> Result<Self> {
        Self::with_config(spec, &EngineConfig::default())
    }

    pub fn with_config(spec: &Value, config: &EngineConfig) -> Result<Self> {
        Self::with_registry(spec, config, Arc::new(FunctionRegistry::builtin()))
    }

    /// Compile with a custom function registry for the modify entries
    pub fn with_registry(spec: &Value, config: &EngineConfig, registry: Arc<FunctionRegistry>) -> Result<Self> {
        let Value::Array(entries) = spec else {
            return Err(SpecError::InvalidChain {
                index: 0,
                message: format!("a chain must be a list of entries, found {}", crate::spec::builder::type_name(spec)),
            }
            .into());
        };

        let stages = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let (kind, spec) = parse_entry(index, entry)?;
                let stage = Stage::compile(kind, spec, config, &registry).map_err(|source| Error::ChainStep {
                    index,
                    operation: kind.name().to_string(),
                    source,
                })?;
                Ok((kind, stage))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { stages })
    }

    /// Operations in the order they run
    pub fn operations(&self) -> impl Iterator<Item = OperationKind> + '_ {
        self.stages.iter().map(|(kind, _)| *kind)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply(&self, input: &Value) -> Value {
        let mut current = input.clone();
        for (index, (kind, stage)) in self.stages.iter().enumerate() {
            trace!(index, operation = kind.name(), "applying chain step");
            current = stage.transform().transform(&current);
        }
        current
    }
}

impl Transform for Chain {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}

fn parse_entry(index: usize, entry: &Value) -> Result<(OperationKind, &Value)> {
    let invalid = |message: String| Error::from(SpecError::InvalidChain { index, message });

    let Value::Object(fields) = entry else {
        return Err(invalid(format!(
            "entry must be an object, found {}",
            crate::spec::builder::type_name(entry)
        )));
    };
    let name = match fields.get("operation") {
        Some(Value::String(name)) => name,
        Some(other) => return Err(invalid(format!("'operation' must be a string, found {}", other))),
        None => return Err(invalid("missing 'operation'".to_string())),
    };
    let kind = OperationKind::from_name(name).ok_or_else(|| invalid(format!("unknown operation '{}'", name)))?;
    let spec = fields
        .get("spec")
        .ok_or_else(|| invalid("missing 'spec'".to_string()))?;
    Ok((kind, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operations_run_in_order() {
        let chain = Chain::new(&json!([
            {"operation": "shift", "spec": {"rating": "score", "name": "title"}},
            {"operation": "default", "spec": {"score": 0, "tags": []}},
            {"operation": "modify-overwrite", "spec": {"title": "=toUpper"}},
            {"operation": "cardinality", "spec": {"score": "MANY"}},
            {"operation": "remove", "spec": {"tags": ""}}
        ]))
        .unwrap();

        assert_eq!(chain.len(), 5);
        assert_eq!(
            chain.apply(&json!({"rating": 4, "name": "dune"})),
            json!({"score": [4], "title": "DUNE"})
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = Chain::new(&json!([])).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(&json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_beta_names_are_accepted() {
        assert_eq!(OperationKind::from_name("modify-default-beta"), Some(OperationKind::ModifyDefault));
        assert_eq!(OperationKind::from_name("shift"), Some(OperationKind::Shift));
        assert_eq!(OperationKind::from_name("sort"), None);
        assert_eq!("cardinality".parse::<OperationKind>().unwrap(), OperationKind::Cardinality);
    }

    #[test]
    fn test_invalid_entries() {
        let err = Chain::new(&json!({"operation": "shift"})).unwrap_err();
        assert!(matches!(err, Error::Spec(SpecError::InvalidChain { index: 0, .. })));

        let err = Chain::new(&json!([{"operation": "shift", "spec": {}}, {"spec": {}}])).unwrap_err();
        assert!(matches!(err, Error::ChainStep { index: 0, .. }));

        let err = Chain::new(&json!([{"operation": "shift", "spec": {"a": "b"}}, {"spec": {}}])).unwrap_err();
        assert!(matches!(err, Error::Spec(SpecError::InvalidChain { index: 1, .. })));

        let err = Chain::new(&json!([{"operation": "nope", "spec": {}}])).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_compile_failure_names_the_step() {
        let err = Chain::new(&json!([
            {"operation": "shift", "spec": {"a": "b"}},
            {"operation": "modify-overwrite", "spec": {"a": "=missingFunction"}}
        ]))
        .unwrap_err();

        match err {
            Error::ChainStep { index, operation, source } => {
                assert_eq!(index, 1);
                assert_eq!(operation, "modify-overwrite");
                assert!(matches!(source, SpecError::UnknownFunction { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
