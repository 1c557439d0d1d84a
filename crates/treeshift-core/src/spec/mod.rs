//! Compiled spec tree
//!
//! A spec document compiles into [`CompositeSpec`] nodes for nested objects
//! and [`LeafSpec`] nodes for everything else. Leaves carry the target the
//! active policy compiled from the right-hand side, so the same tree shape
//! serves shift, default, remove, modify and cardinality specs.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod builder;

pub use builder::SpecBuilder;

use crate::path::PathElement;
use serde::Serialize;
use std::collections::BTreeMap;

/// How a composite matches its literal and computed children against input keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Only literal children: probe the input for each literal key
    LiteralsOnly,
    /// Only computed children: try each input key against them in order
    ComputedOnly,
    /// Both kinds, but no input key can satisfy both; a literal hit skips the
    /// computed search
    NoConflict,
    /// Both kinds and some overlap: literal lookup first, computed children on a miss
    Conflict,
}

/// A compiled spec node
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode<T> {
    Leaf(LeafSpec<T>),
    Composite(CompositeSpec<T>),
}

impl<T> SpecNode<T> {
    pub fn element(&self) -> &PathElement {
        match self {
            SpecNode::Leaf(leaf) => &leaf.element,
            SpecNode::Composite(composite) => &composite.element,
        }
    }
}

/// A key with a right-hand-side target
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSpec<T> {
    pub element: PathElement,
    pub raw_key: String,
    pub target: T,
}

/// A key with a nested spec
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSpec<T> {
    pub element: PathElement,
    pub raw_key: String,
    /// Declared with a trailing `[]`: the matched level is a list
    pub is_array: bool,
    /// Applied to this level itself; never block sibling matching
    pub special: Vec<SpecNode<T>>,
    /// Keyed by the unescaped literal key
    pub literal: BTreeMap<String, SpecNode<T>>,
    /// In precedence order
    pub computed: Vec<SpecNode<T>>,
    pub strategy: ExecutionStrategy,
}

impl<T> CompositeSpec<T> {
    /// Number of direct children across all three buckets
    pub fn child_count(&self) -> usize {
        self.special.len() + self.literal.len() + self.computed.len()
    }
}

/// Shape of a compiled spec, reported when compilation finishes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecStats {
    pub composites: usize,
    pub leaves: usize,
    pub special: usize,
    pub literal: usize,
    pub computed: usize,
    pub max_depth: usize,
    pub literals_only: usize,
    pub computed_only: usize,
    pub no_conflict: usize,
    pub conflict: usize,
}

impl SpecStats {
    pub(crate) fn record_strategy(&mut self, strategy: ExecutionStrategy) {
        match strategy {
            ExecutionStrategy::LiteralsOnly => self.literals_only += 1,
            ExecutionStrategy::ComputedOnly => self.computed_only += 1,
            ExecutionStrategy::NoConflict => self.no_conflict += 1,
            ExecutionStrategy::Conflict => self.conflict += 1,
        }
    }
}
