//! Output path evaluator
//!
//! A write path (the right-hand side of a shift spec) is a dot-separated list
//! of segments compiled once per spec:
//!
//! - `name`, `prefix-&1`, `&(1,2)`: map keys, with `&` references resolved
//!   against the walked path
//! - `@(1,field)` / `@field`: a key read from the input
//! - `[3]`, `[&1]`, `[#2]`, `[@(1,idx)]`: list indices
//! - `[]`: append to a list
//!
//! Every compiled path starts with the synthetic root segment so that `""`
//! addresses the whole output document. Resolution misses make the write a
//! no-op rather than an error.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod traversal;

pub use traversal::{PathStep, MAX_LIST_INDEX};

use crate::error::SpecError;
use crate::path::scanner::{split_top_level, ScanError, Scanner};
use crate::path::{Reference, Template, Transpose};
use crate::walked::WalkedPath;
use serde_json::Value;

/// A list index in a write path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStep {
    Literal(usize),
    Reference(Reference),
    /// Match count of the frame N levels below the top
    Count(usize),
    Lookup(Transpose),
    Append,
}

/// One compiled step of a write or read path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(Template),
    Lookup(Transpose),
    Index(IndexStep),
}

impl Step {
    /// Resolve to a concrete step; `None` on any resolution miss
    pub fn resolve(&self, walked: &WalkedPath<'_>) -> Option<PathStep> {
        match self {
            Step::Key(template) => template.resolve(walked).map(PathStep::Key),
            Step::Lookup(transpose) => scalar_key(transpose.lookup(walked)?).map(PathStep::Key),
            Step::Index(IndexStep::Append) => Some(PathStep::Append),
            Step::Index(index) => {
                let index = match index {
                    IndexStep::Literal(index) => *index,
                    IndexStep::Reference(reference) => reference.resolve(walked)?.parse::<usize>().ok()?,
                    IndexStep::Count(up) => walked.from_top(*up)?.count(),
                    IndexStep::Lookup(transpose) => scalar_index(transpose.lookup(walked)?)?,
                    IndexStep::Append => return Some(PathStep::Append),
                };
                (index <= MAX_LIST_INDEX).then_some(PathStep::Index(index))
            }
        }
    }
}

/// Render a scalar as a map key
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn scalar_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|index| usize::try_from(index).ok()),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Parse a dot-separated path; the empty string is the empty path
pub fn parse_steps(raw: &str, offset: usize) -> Result<Vec<Step>, ScanError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut steps = Vec::new();
    for (segment, start) in split_top_level(raw, '.').map_err(|e| ScanError::new(e.message, e.position + offset))? {
        if segment.is_empty() {
            return Err(ScanError::new("empty path segment", offset + start));
        }
        steps.extend(parse_segment(&segment, offset + start)?);
    }
    Ok(steps)
}

fn parse_segment(segment: &str, offset: usize) -> Result<Vec<Step>, ScanError> {
    let mut scanner = Scanner::with_offset(segment, offset);
    let mut steps = Vec::new();

    match scanner.current_char() {
        Some('@') => steps.push(Step::Lookup(Transpose::scan(&mut scanner)?)),
        Some('[') => {}
        _ => steps.push(Step::Key(Template::from_pieces(scanner.scan_pieces(false, &['['])?))),
    }

    while let Some(ch) = scanner.current_char() {
        if ch != '[' {
            return Err(scanner.error(format!("unexpected `{}` after array index", ch)));
        }
        steps.push(Step::Index(parse_index(&mut scanner)?));
    }
    Ok(steps)
}

fn parse_index(scanner: &mut Scanner) -> Result<IndexStep, ScanError> {
    scanner.expect_char('[')?;
    let index = match scanner.current_char() {
        Some(']') => IndexStep::Append,
        Some(ch) if ch.is_ascii_digit() => {
            let start = scanner.position();
            let index = scanner.parse_number()?;
            if index > MAX_LIST_INDEX {
                return Err(ScanError::new(
                    format!("array index {} exceeds the limit of {}", index, MAX_LIST_INDEX),
                    start,
                ));
            }
            IndexStep::Literal(index)
        }
        Some('&') => {
            scanner.advance();
            IndexStep::Reference(scanner.parse_reference_tail()?)
        }
        Some('#') => {
            scanner.advance();
            let reference = scanner.parse_reference_tail()?;
            if reference.group_index != 0 {
                return Err(scanner.error("`#` takes a single level argument"));
            }
            IndexStep::Count(reference.path_index)
        }
        Some('@') => IndexStep::Lookup(Transpose::scan(scanner)?),
        Some(ch) => return Err(scanner.error(format!("invalid array index starting with `{}`", ch))),
        None => return Err(scanner.error("unclosed `[`")),
    };
    scanner.expect_char(']')?;
    Ok(index)
}

/// Resolve every step; `None` if any of them misses
pub fn resolve_steps(steps: &[Step], walked: &WalkedPath<'_>) -> Option<Vec<PathStep>> {
    steps.iter().map(|step| step.resolve(walked)).collect()
}

/// Dotted rendering with fully parameterized references
pub fn canonical_steps(steps: &[Step]) -> String {
    let mut rendered = String::new();
    for step in steps {
        match step {
            Step::Key(template) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(&template.canonical());
            }
            Step::Lookup(transpose) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(&transpose.canonical());
            }
            Step::Index(index) => {
                rendered.push('[');
                match index {
                    IndexStep::Literal(index) => rendered.push_str(&index.to_string()),
                    IndexStep::Reference(reference) => rendered.push_str(&reference.canonical('&')),
                    IndexStep::Count(up) => rendered.push_str(&format!("#({})", up)),
                    IndexStep::Lookup(transpose) => rendered.push_str(&transpose.canonical()),
                    IndexStep::Append => {}
                }
                rendered.push(']');
            }
        }
    }
    rendered
}

/// A compiled write target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    raw: String,
    steps: Vec<Step>,
}

impl OutputPath {
    /// Compile `raw` below the synthetic root segment `root_key`
    pub fn parse(raw: &str, root_key: &str) -> Result<Self, SpecError> {
        let mut steps = vec![Step::Key(Template::literal(root_key))];
        steps.extend(
            parse_steps(raw, 0).map_err(|e| SpecError::invalid_write_path(raw, e.message, Some(e.position)))?,
        );
        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    /// The path as written in the spec
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn resolve(&self, walked: &WalkedPath<'_>) -> Option<Vec<PathStep>> {
        resolve_steps(&self.steps, walked)
    }

    /// Merge `data` into `output`; `false` when resolution or the write failed
    pub fn write(&self, data: Value, output: &mut Value, walked: &WalkedPath<'_>) -> bool {
        match self.resolve(walked) {
            Some(steps) => traversal::write_merged(output, &steps, data),
            None => false,
        }
    }

    /// The value currently at this path in `tree`
    pub fn read<'v>(&self, tree: &'v Value, walked: &WalkedPath<'_>) -> Option<&'v Value> {
        traversal::get(tree, &self.resolve(walked)?)
    }

    pub fn canonical(&self) -> String {
        canonical_steps(&self.steps)
    }
}
