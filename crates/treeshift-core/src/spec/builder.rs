//! Spec tree construction
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::{CompositeSpec, ExecutionStrategy, LeafSpec, SpecNode, SpecStats};
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::output::MAX_LIST_INDEX;
use crate::path::{compare_precedence, parse_key, split_alternatives, strip_array_marker, PathElement};
use crate::walker::{LeafPolicy, TargetContext};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Compiles a raw spec document into a tree of [`SpecNode`]s for one policy
pub struct SpecBuilder<'p, P: LeafPolicy> {
    policy: &'p P,
    config: &'p EngineConfig,
    stats: SpecStats,
}

impl<'p, P: LeafPolicy> SpecBuilder<'p, P> {
    pub fn new(policy: &'p P, config: &'p EngineConfig) -> Self {
        Self {
            policy,
            config,
            stats: SpecStats::default(),
        }
    }

    /// Build the root composite; the document must be a non-empty object
    pub fn build(mut self, raw: &Value) -> Result<(CompositeSpec<P::Target>, SpecStats), SpecError> {
        let Value::Object(children) = raw else {
            return Err(SpecError::invalid_value(
                "",
                format!("a spec must be an object, found {}", type_name(raw)),
            ));
        };
        let root_key = self.config.root_key.clone();
        if children.is_empty() {
            return Err(SpecError::EmptyContainer {
                key: root_key,
                location: String::new(),
            });
        }

        let root = self.build_composite(PathElement::Literal(root_key.clone()), root_key, false, children, "", 0)?;
        Ok((root, self.stats))
    }

    fn build_composite(
        &mut self,
        element: PathElement,
        raw_key: String,
        is_array: bool,
        children: &Map<String, Value>,
        location: &str,
        depth: usize,
    ) -> Result<CompositeSpec<P::Target>, SpecError> {
        if depth > self.config.max_spec_depth {
            return Err(SpecError::TooDeep {
                limit: self.config.max_spec_depth,
                location: location.to_string(),
            });
        }
        self.stats.composites += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let mut special = Vec::new();
        let mut literal = BTreeMap::new();
        let mut computed = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for (raw_child, value) in children {
            let alternatives =
                split_alternatives(raw_child).map_err(|e| e.at(&join_location(location, raw_child)))?;

            for alternative in alternatives {
                let child_location = join_location(location, &alternative);
                let node = self.build_child(&alternative, value, &child_location, depth)?;
                let element = node.element();

                if is_array && !is_array_child(element) {
                    return Err(SpecError::InvalidArrayKey {
                        key: alternative,
                        location: child_location,
                    });
                }

                let canonical = element.canonical();
                if let Some(first) = seen.insert(canonical.clone(), alternative.clone()) {
                    return Err(SpecError::DuplicateKey {
                        first,
                        second: alternative,
                        canonical,
                        location: location.to_string(),
                    });
                }

                if element.is_special() {
                    self.stats.special += 1;
                    special.push(node);
                } else if element.is_computed() {
                    self.stats.computed += 1;
                    computed.push(node);
                } else if let PathElement::Literal(text) = element {
                    self.stats.literal += 1;
                    literal.insert(text.clone(), node);
                }
            }
        }

        computed.sort_by(|a, b| compare_precedence(a.element(), b.element()));
        let strategy = choose_strategy(&literal, &computed);
        self.stats.record_strategy(strategy);

        Ok(CompositeSpec {
            element,
            raw_key,
            is_array,
            special,
            literal,
            computed,
            strategy,
        })
    }

    fn build_child(
        &mut self,
        raw_key: &str,
        value: &Value,
        location: &str,
        depth: usize,
    ) -> Result<SpecNode<P::Target>, SpecError> {
        let context = TargetContext::new(location, self.config);

        if let Value::Object(children) = value {
            let (key, is_array) = strip_array_marker(raw_key);
            let element = parse_key(key).map_err(|e| e.at(location))?;
            if !element.accepts_children() {
                return Err(SpecError::SpecialWithChildren {
                    key: raw_key.to_string(),
                    location: location.to_string(),
                });
            }
            if children.is_empty() {
                return Err(SpecError::EmptyContainer {
                    key: raw_key.to_string(),
                    location: location.to_string(),
                });
            }
            self.policy
                .validate_element(&element, &context)
                .map_err(|e| e.at(location))?;

            let composite =
                self.build_composite(element, raw_key.to_string(), is_array, children, location, depth + 1)?;
            return Ok(SpecNode::Composite(composite));
        }

        let element = parse_key(raw_key).map_err(|e| e.at(location))?;
        self.policy
            .validate_element(&element, &context)
            .map_err(|e| e.at(location))?;
        let target = self
            .policy
            .compile_target(value, &context)
            .map_err(|e| e.at(location))?;

        self.stats.leaves += 1;
        Ok(SpecNode::Leaf(LeafSpec {
            element,
            raw_key: raw_key.to_string(),
            target,
        }))
    }
}

fn join_location(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Children of a `key[]` composite address list positions
fn is_array_child(element: &PathElement) -> bool {
    match element {
        PathElement::Literal(text) => text.parse::<usize>().is_ok_and(|index| index <= MAX_LIST_INDEX),
        _ => true,
    }
}

fn choose_strategy<T>(literal: &BTreeMap<String, SpecNode<T>>, computed: &[SpecNode<T>]) -> ExecutionStrategy {
    if computed.is_empty() {
        return ExecutionStrategy::LiteralsOnly;
    }
    if literal.is_empty() {
        return ExecutionStrategy::ComputedOnly;
    }

    let conflict = computed.iter().any(|child| {
        literal
            .keys()
            .any(|key| child.element().could_match_literal(key))
    });
    if conflict {
        ExecutionStrategy::Conflict
    } else {
        ExecutionStrategy::NoConflict
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
