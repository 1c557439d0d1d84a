//! Tree-walk driver
//!
//! One depth-first pass matches an input tree against a compiled spec. The
//! walk itself knows nothing about shifting, defaulting or removing: when a
//! leaf matches, the active [`LeafPolicy`] decides what happens and returns
//! a [`WriteDecision`]. Writes go to a fresh output tree; replacements and
//! removals are recorded as [`Edit`]s against the location in the input and
//! applied to a copy of the input once the walk is over.
//!
//! Locations are only tracked while the walk follows the real structure of
//! the input. Branches entered through a lookup, a `$`/`#` key or a scalar
//! treated as a key are detached and never produce edits.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::output::{scalar_key, traversal, OutputPath, PathStep};
use crate::path::PathElement;
use crate::spec::{CompositeSpec, ExecutionStrategy, SpecBuilder, SpecNode, SpecStats};
use crate::walked::{MatchedKey, WalkedPath};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

static NULL: Value = Value::Null;

/// Where in the spec a right-hand side is being compiled
pub struct TargetContext<'c> {
    location: &'c str,
    config: &'c EngineConfig,
}

impl<'c> TargetContext<'c> {
    pub fn new(location: &'c str, config: &'c EngineConfig) -> Self {
        Self { location, config }
    }

    /// Dotted path of the spec node
    pub fn location(&self) -> &'c str {
        self.location
    }

    pub fn config(&self) -> &'c EngineConfig {
        self.config
    }
}

/// Behaviour of one operation at matched leaves
pub trait LeafPolicy: Send + Sync {
    /// Compiled right-hand side of a leaf
    type Target: fmt::Debug + Clone + PartialEq + Send + Sync;

    /// Operation name used in logs
    const NAME: &'static str;

    /// Compile the right-hand side of a leaf
    fn compile_target(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<Self::Target, SpecError>;

    /// Reject keys this operation has no meaning for
    fn validate_element(&self, _element: &PathElement, _context: &TargetContext<'_>) -> Result<(), SpecError> {
        Ok(())
    }

    /// Also visit literal keys that are absent from the input
    fn visits_missing(&self) -> bool {
        false
    }

    /// Decide what to do for one matched leaf
    fn leaf_action<'t>(&self, target: &'t Self::Target, matched: &MatchContext<'_, '_>) -> WriteDecision<'t>;
}

/// What a policy sees at a matched leaf
pub struct MatchContext<'m, 'a> {
    element: &'m PathElement,
    key: &'m str,
    data: Option<&'m Value>,
    walked: &'m WalkedPath<'a>,
}

impl<'m, 'a> MatchContext<'m, 'a> {
    /// The leaf's own path element
    pub fn element(&self) -> &'m PathElement {
        self.element
    }

    /// The input key that was matched
    pub fn key(&self) -> &'m str {
        self.key
    }

    /// The data at the leaf; `None` for a key missing from the input
    pub fn data(&self) -> Option<&'m Value> {
        self.data
    }

    /// Frames of the walk, including the leaf's own frame on top
    pub fn walked(&self) -> &'m WalkedPath<'a> {
        self.walked
    }

    /// Matched through a special key (`@`, `$`, `#`, lookups)
    pub fn is_special(&self) -> bool {
        self.element.is_special()
    }
}

/// Outcome of [`LeafPolicy::leaf_action`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteDecision<'t> {
    /// Do nothing
    Skip,
    /// Merge `data` into the output at every target path
    Write { data: Value, targets: &'t [OutputPath] },
    /// Replace the value at the leaf's input location
    Replace(Value),
    /// Delete the leaf's input location
    Remove,
}

/// A recorded change to the input
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub location: Vec<PathStep>,
    pub op: EditOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Replace(Value),
    Remove,
}

/// Everything one walk produced
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutcome {
    output: Value,
    edits: Vec<Edit>,
}

impl WalkOutcome {
    /// The output tree, still wrapped in its root segment
    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// The value written below the root segment, or null if nothing was written
    pub fn into_output(self, root_key: &str) -> Value {
        match self.output {
            Value::Object(mut map) => map.remove(root_key).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// A copy of `input` with the recorded edits applied
    ///
    /// Replacements run in walk order; removals run afterwards, deepest and
    /// highest index first so sibling list positions stay valid.
    pub fn apply_edits(self, input: &Value) -> Value {
        let mut result = input.clone();
        let mut removals = Vec::new();

        for edit in self.edits {
            match edit.op {
                EditOp::Replace(value) => {
                    traversal::set(&mut result, &edit.location, value);
                }
                EditOp::Remove => removals.push(edit.location),
            }
        }

        removals.sort_unstable_by(|a, b| b.cmp(a));
        removals.dedup();
        for location in removals {
            if location.is_empty() {
                result = Value::Null;
            } else {
                traversal::remove(&mut result, &location);
            }
        }
        result
    }
}

/// A spec compiled for one policy; immutable and shareable across threads
pub struct CompiledSpec<P: LeafPolicy> {
    policy: P,
    root: CompositeSpec<P::Target>,
    root_key: String,
    stats: SpecStats,
}

impl<P: LeafPolicy> CompiledSpec<P> {
    pub fn compile(policy: P, raw: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        let (root, stats) = SpecBuilder::new(&policy, config).build(raw)?;
        debug!(
            operation = P::NAME,
            composites = stats.composites,
            leaves = stats.leaves,
            literal = stats.literal,
            computed = stats.computed,
            special = stats.special,
            conflict = stats.conflict,
            max_depth = stats.max_depth,
            "compiled spec"
        );

        Ok(Self {
            policy,
            root,
            root_key: config.root_key.clone(),
            stats,
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn root(&self) -> &CompositeSpec<P::Target> {
        &self.root
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn stats(&self) -> &SpecStats {
        &self.stats
    }

    /// Run one walk over `input`
    pub fn walk(&self, input: &Value) -> WalkOutcome {
        let mut walker = Walker::new(&self.policy);
        walker.walked.push(MatchedKey::new(self.root_key.as_str()), Some(input));
        walker.process(&self.root, Some(input));
        walker.walked.pop();

        WalkOutcome {
            output: walker.output,
            edits: walker.edits,
        }
    }
}

impl<P: LeafPolicy> PartialEq for CompiledSpec<P> {
    fn eq(&self, other: &Self) -> bool {
        self.root_key == other.root_key && self.root == other.root
    }
}

impl<P: LeafPolicy> fmt::Debug for CompiledSpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSpec")
            .field("operation", &P::NAME)
            .field("root_key", &self.root_key)
            .field("stats", &self.stats)
            .field("root", &self.root)
            .finish()
    }
}

/// Where a matched child sits relative to its parent in the input
#[derive(Debug, Clone, Copy)]
enum Slot<'k> {
    Key(&'k str),
    Index(usize),
    /// The parent's own location (`@`)
    Same,
    /// Not a location in the input
    Detached,
}

struct Walker<'s, 'a, P: LeafPolicy> {
    policy: &'s P,
    walked: WalkedPath<'a>,
    location: Vec<PathStep>,
    detached: usize,
    output: Value,
    edits: Vec<Edit>,
}

impl<'s, 'a, P: LeafPolicy> Walker<'s, 'a, P> {
    fn new(policy: &'s P) -> Self {
        Self {
            policy,
            walked: WalkedPath::new(),
            location: Vec::new(),
            detached: 0,
            output: Value::Object(Map::new()),
            edits: Vec::new(),
        }
    }

    /// Match one input key against a non-special node; `true` if it claimed the key
    fn apply_node(
        &mut self,
        node: &'s SpecNode<P::Target>,
        key: &str,
        input: Option<&'a Value>,
        slot: Slot<'_>,
    ) -> bool {
        let Some(matched) = node.element().match_key(key, &self.walked) else {
            return false;
        };

        self.enter(slot);
        self.walked.push(matched, input);
        match node {
            SpecNode::Leaf(leaf) => self.act(&leaf.element, key, &leaf.target, input),
            SpecNode::Composite(composite) => self.process(composite, input),
        }
        self.walked.pop();
        self.leave(slot);
        self.walked.increment_top();
        true
    }

    /// Special children describe the level they sit in; they always run and
    /// never count as a match
    fn apply_special(&mut self, node: &'s SpecNode<P::Target>, parent_input: Option<&'a Value>) {
        let element = node.element();
        let Some(parent_key) = self.walked.from_top(0).map(|frame| frame.matched().raw().to_string()) else {
            return;
        };

        let (key, owned, input, slot) = match element {
            PathElement::At => (parent_key, None, parent_input, Slot::Same),
            PathElement::Dollar(reference) => {
                let Some(resolved) = reference.resolve(&self.walked) else {
                    return;
                };
                let resolved = resolved.to_string();
                (resolved.clone(), Some(Value::String(resolved)), None, Slot::Detached)
            }
            PathElement::Hash(up) => {
                let Some(frame) = self.walked.from_top(*up) else {
                    return;
                };
                let count = frame.count().to_string();
                (count.clone(), Some(Value::String(count)), None, Slot::Detached)
            }
            PathElement::Constant(text) => (text.clone(), Some(Value::String(text.clone())), None, Slot::Detached),
            PathElement::Transpose(transpose) => {
                let Some(value) = transpose.lookup(&self.walked) else {
                    return;
                };
                (scalar_key(value).unwrap_or_default(), None, Some(value), Slot::Detached)
            }
            _ => return,
        };

        self.enter(slot);
        self.walked.push(MatchedKey::new(key.as_str()), input);
        match node {
            SpecNode::Leaf(leaf) => self.act(element, &key, &leaf.target, owned.as_ref().or(input)),
            SpecNode::Composite(composite) => self.process(composite, input),
        }
        self.walked.pop();
        self.leave(slot);
    }

    fn act(&mut self, element: &PathElement, key: &str, target: &'s P::Target, data: Option<&Value>) {
        let decision = {
            let context = MatchContext {
                element,
                key,
                data,
                walked: &self.walked,
            };
            self.policy.leaf_action(target, &context)
        };

        match decision {
            WriteDecision::Skip => {}
            WriteDecision::Write { data, targets } => {
                for target in targets {
                    target.write(data.clone(), &mut self.output, &self.walked);
                }
            }
            WriteDecision::Replace(value) => self.record(EditOp::Replace(value)),
            WriteDecision::Remove => self.record(EditOp::Remove),
        }
    }

    fn record(&mut self, op: EditOp) {
        if self.detached == 0 {
            self.edits.push(Edit {
                location: self.location.clone(),
                op,
            });
        }
    }

    fn enter(&mut self, slot: Slot<'_>) {
        match slot {
            Slot::Key(key) => self.location.push(PathStep::Key(key.to_string())),
            Slot::Index(index) => self.location.push(PathStep::Index(index)),
            Slot::Same => {}
            Slot::Detached => self.detached += 1,
        }
    }

    fn leave(&mut self, slot: Slot<'_>) {
        match slot {
            Slot::Key(_) | Slot::Index(_) => {
                self.location.pop();
            }
            Slot::Same => {}
            Slot::Detached => self.detached -= 1,
        }
    }

    /// Children of a matched composite against its input
    fn process(&mut self, composite: &'s CompositeSpec<P::Target>, input: Option<&'a Value>) {
        for special in &composite.special {
            self.apply_special(special, input);
        }

        match input {
            Some(Value::Object(map)) => self.process_map(composite, map),
            Some(Value::Array(list)) => self.process_list(composite, list),
            Some(Value::Null) | None => {}
            Some(scalar) => self.process_scalar(composite, scalar),
        }

        if self.policy.visits_missing() {
            self.process_missing(composite, input);
        }
    }

    fn process_map(&mut self, composite: &'s CompositeSpec<P::Target>, map: &'a Map<String, Value>) {
        match composite.strategy {
            ExecutionStrategy::LiteralsOnly => self.literal_pass(composite, map),
            ExecutionStrategy::ComputedOnly => {
                for (key, value) in map {
                    self.apply_computed(composite, key, Some(value), Slot::Key(key));
                }
            }
            ExecutionStrategy::NoConflict => {
                for (key, value) in map {
                    match composite.literal.get(key) {
                        Some(child) => {
                            self.apply_node(child, key, Some(value), Slot::Key(key));
                        }
                        None => {
                            self.apply_computed(composite, key, Some(value), Slot::Key(key));
                        }
                    }
                }
            }
            ExecutionStrategy::Conflict => {
                for (key, value) in map {
                    self.apply_keyed(composite, key, Some(value), Slot::Key(key));
                }
            }
        }
    }

    fn literal_pass(&mut self, composite: &'s CompositeSpec<P::Target>, map: &'a Map<String, Value>) {
        for (key, child) in &composite.literal {
            if let Some(value) = map.get(key) {
                self.apply_node(child, key, Some(value), Slot::Key(key));
            }
        }
    }

    /// List elements are matched in index order, keyed by their index
    fn process_list(&mut self, composite: &'s CompositeSpec<P::Target>, list: &'a [Value]) {
        for (index, value) in list.iter().enumerate() {
            let key = index.to_string();
            self.apply_keyed(composite, &key, Some(value), Slot::Index(index));
        }
    }

    /// A scalar is matched as a single key with null data
    fn process_scalar(&mut self, composite: &'s CompositeSpec<P::Target>, scalar: &'a Value) {
        if let Some(key) = scalar_key(scalar) {
            self.apply_keyed(composite, &key, Some(&NULL), Slot::Detached);
        }
    }

    /// Literal children whose key is absent from the input
    fn process_missing(&mut self, composite: &'s CompositeSpec<P::Target>, input: Option<&'a Value>) {
        for (key, child) in &composite.literal {
            let slot = match input {
                Some(Value::Object(map)) if map.contains_key(key) => continue,
                Some(Value::Array(list)) => match key.parse::<usize>() {
                    Ok(index) if index < list.len() => continue,
                    Ok(index) => Slot::Index(index),
                    Err(_) => continue,
                },
                Some(Value::Object(_)) | Some(Value::Null) | None => {
                    if composite.is_array {
                        match key.parse::<usize>() {
                            Ok(index) => Slot::Index(index),
                            Err(_) => continue,
                        }
                    } else {
                        Slot::Key(key)
                    }
                }
                Some(_) => return,
            };
            self.apply_node(child, key, None, slot);
        }
    }

    /// Literal child first, computed children in precedence order on a miss
    fn apply_keyed(
        &mut self,
        composite: &'s CompositeSpec<P::Target>,
        key: &str,
        input: Option<&'a Value>,
        slot: Slot<'_>,
    ) -> bool {
        if let Some(child) = composite.literal.get(key) {
            if self.apply_node(child, key, input, slot) {
                return true;
            }
        }
        self.apply_computed(composite, key, input, slot)
    }

    fn apply_computed(
        &mut self,
        composite: &'s CompositeSpec<P::Target>,
        key: &str,
        input: Option<&'a Value>,
        slot: Slot<'_>,
    ) -> bool {
        composite
            .computed
            .iter()
            .any(|child| self.apply_node(child, key, input, slot))
    }
}
