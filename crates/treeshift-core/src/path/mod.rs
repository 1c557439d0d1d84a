//! Path-expression grammar
//!
//! Spec keys (left-hand side) parse into [`PathElement`]s. The same scanner
//! and reference machinery is shared with the write-path grammar in
//! [`crate::output`].
//!
//! ## Key syntax
//!
//! - `foo`: literal key, `\` escapes special characters
//! - `*`, `a*`, `a*b*c`: wildcards, each `*` capturing one or more characters
//! - `&`, `&1`, `&(1,2)`, `pre-&1`: keys computed from back-references
//! - `$`, `$(1,0)`: the matched key as data
//! - `@`: the current input value as data
//! - `@(1,path)`: a value looked up relative to an ancestor level
//! - `#`, `#2`: the running match count of a level; `#text` is a constant
//! - `a|b`: or-group, expanded into sibling keys at compile time
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod element;
pub mod glob;
pub mod parser;
pub mod reference;
pub mod scanner;
pub mod transpose;

pub use element::{compare_precedence, precedence_rank, PathElement};
pub use parser::{parse_key, split_alternatives, strip_array_marker};
pub use reference::{Reference, Segment, Template};
pub use transpose::Transpose;
