//! Operations built on the shared walker
//!
//! Each operation is a [`LeafPolicy`](crate::walker::LeafPolicy) plus a thin
//! wrapper that compiles a spec once and applies it to any number of inputs:
//!
//! - [`Shift`]: copy matched data into a new document
//! - [`Defaults`]: fill in missing or null values
//! - [`Remove`]: delete matched locations
//! - [`Modify`]: recompute values from literals, lookups or functions
//! - [`Cardinality`]: normalize values to one element or a list
//! - [`Chain`]: run several operations in sequence
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod cardinality;
pub mod chain;
pub mod defaults;
pub mod modify;
pub mod remove;
pub mod shift;

pub use cardinality::{Cardinality, CardinalityPolicy, Multiplicity};
pub use chain::{Chain, OperationKind};
pub use defaults::{Defaults, DefaultsPolicy};
pub use modify::{Argument, FunctionCall, Modify, ModifyMode, ModifyPolicy, ModifyTarget, ValueSource};
pub use remove::{Remove, RemovePolicy};
pub use shift::{Shift, ShiftPolicy};

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A compiled, reusable transformation
///
/// Implementations are immutable after construction and safe to call from
/// several threads at once.
pub trait Transform: Send + Sync {
    /// Produce a new document; the input is never modified
    fn transform(&self, input: &Value) -> Value;

    /// Transform and decode the result into a typed value
    fn transform_as<T: DeserializeOwned>(&self, input: &Value) -> Result<T>
    where
        Self: Sized,
    {
        serde_json::from_value(self.transform(input)).map_err(|source| Error::Json {
            message: "transformed document does not match the requested type".to_string(),
            source,
        })
    }
}
