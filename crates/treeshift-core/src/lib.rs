//! Treeshift Core - declarative transformations of JSON trees
//!
//! A spec is itself a JSON document whose keys are patterns matched against
//! an input tree and whose leaves say what to do with each match. Specs are
//! compiled once into an immutable tree and can then be applied to any
//! number of inputs, from any number of threads.
//!
//! # Main Components
//!
//! - **Path grammar** ([`path`]): key patterns, wildcards and `&`/`$`/`#`/`@` references
//! - **Spec tree** ([`spec`]): compiled specs with per-level execution strategies
//! - **Walker** ([`walker`]): the matching kernel shared by every operation
//! - **Output paths** ([`output`]): dotted write paths with array indices
//! - **Operations** ([`transform`]): shift, default, remove, modify, cardinality, chain
//! - **Functions** ([`functions`]): the registry behind `=name(...)` expressions
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let spec = treeshift_core::compile(&json!({
//!     "rating": { "primary": { "value": "Rating" } }
//! })).unwrap();
//!
//! let output = treeshift_core::apply(&spec, &json!({
//!     "rating": { "primary": { "value": 3 } }
//! }));
//! assert_eq!(output, json!({ "Rating": 3 }));
//! ```
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod error;
pub mod functions;
pub mod output;
pub mod path;
pub mod spec;
pub mod transform;
pub mod walked;
pub mod walker;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{Error, Result, SpecError};
pub use functions::{Function, FunctionRegistry};
pub use output::OutputPath;
pub use path::{PathElement, Reference, Transpose};
pub use spec::{CompositeSpec, ExecutionStrategy, LeafSpec, SpecNode, SpecStats};
pub use transform::{
    Cardinality, Chain, Defaults, Modify, ModifyMode, Multiplicity, OperationKind, Remove, Shift, Transform,
};
pub use walked::{MatchedKey, WalkedPath};
pub use walker::{CompiledSpec, LeafPolicy, MatchContext, WalkOutcome, WriteDecision};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a shift spec with the default configuration
pub fn compile(spec: &serde_json::Value) -> std::result::Result<Shift, SpecError> {
    Shift::new(spec)
}

/// Compile a shift spec with an explicit configuration
pub fn compile_with(spec: &serde_json::Value, config: &EngineConfig) -> std::result::Result<Shift, SpecError> {
    Shift::with_config(spec, config)
}

/// Apply a compiled shift spec; the input is left untouched
pub fn apply(spec: &Shift, input: &serde_json::Value) -> serde_json::Value {
    spec.apply(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_compile_and_apply() {
        let spec = compile(&json!({"a": {"b": "&1"}})).unwrap();
        assert_eq!(apply(&spec, &json!({"a": {"b": 5}})), json!({"a": 5}));
    }

    #[test]
    fn test_compile_with_config() {
        let config = EngineConfig::default().with_max_spec_depth(1);
        let err = compile_with(&json!({"a": {"b": {"c": "d"}}}), &config).unwrap_err();
        assert!(matches!(err, SpecError::TooDeep { limit: 1, .. }));
    }

    #[test]
    fn test_compiled_specs_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Shift>();
        assert_send_sync::<Chain>();
        assert_send_sync::<Modify>();
    }
}
