//! Typed left-hand-side path elements
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::glob::{StarDouble, StarRegex, StarSingle};
use super::reference::{Reference, Template};
use super::scanner::escape_key;
use super::transpose::Transpose;
use crate::walked::{MatchedKey, WalkedPath};
use std::cmp::Ordering;
use std::fmt;

/// One parsed spec key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    /// Exact key
    Literal(String),
    /// `*`
    StarAll,
    /// `a*b`
    StarSingle(StarSingle),
    /// `a*b*c`
    StarDouble(StarDouble),
    /// Three or more stars
    StarRegex(StarRegex),
    /// Key computed from `&` references, e.g. `&1` or `item-&(1,1)`
    Amp(Template),
    /// `$`, `$(p,g)`: the matched key becomes the data
    Dollar(Reference),
    /// `@`: the enclosing input value becomes the data
    At,
    /// `#`, `#2`: a match count becomes the data
    Hash(usize),
    /// `#text`: the literal text becomes the data
    Constant(String),
    /// `@(p,path)`: a looked-up value becomes the data
    Transpose(Transpose),
}

impl PathElement {
    /// Parse a single key (no or-groups)
    pub fn parse(raw: &str) -> Result<Self, crate::error::SpecError> {
        super::parser::parse_key(raw)
    }

    /// Match an input key; LHS references resolve against the frames above
    /// the level being matched
    ///
    /// Special elements never match input keys; the walker applies them
    /// separately.
    pub fn match_key(&self, key: &str, walked: &WalkedPath<'_>) -> Option<MatchedKey> {
        match self {
            PathElement::Literal(literal) => (literal == key).then(|| MatchedKey::new(key)),
            PathElement::StarAll => Some(MatchedKey::new(key)),
            PathElement::StarSingle(star) => star.captures(key).map(|c| MatchedKey::with_captures(key, c)),
            PathElement::StarDouble(star) => star.captures(key).map(|c| MatchedKey::with_captures(key, c)),
            PathElement::StarRegex(star) => star.captures(key).map(|c| MatchedKey::with_captures(key, c)),
            PathElement::Amp(template) => (template.resolve(walked)? == key).then(|| MatchedKey::new(key)),
            PathElement::Dollar(_)
            | PathElement::At
            | PathElement::Hash(_)
            | PathElement::Constant(_)
            | PathElement::Transpose(_) => None,
        }
    }

    /// Applied to the enclosing level instead of matched against its keys
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            PathElement::Dollar(_)
                | PathElement::At
                | PathElement::Hash(_)
                | PathElement::Constant(_)
                | PathElement::Transpose(_)
        )
    }

    /// Matched by computation rather than a map lookup
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            PathElement::StarAll
                | PathElement::StarSingle(_)
                | PathElement::StarDouble(_)
                | PathElement::StarRegex(_)
                | PathElement::Amp(_)
        )
    }

    pub fn is_star(&self) -> bool {
        matches!(
            self,
            PathElement::StarAll | PathElement::StarSingle(_) | PathElement::StarDouble(_) | PathElement::StarRegex(_)
        )
    }

    /// Whether a nested spec may hang below this element
    pub fn accepts_children(&self) -> bool {
        !matches!(
            self,
            PathElement::Dollar(_) | PathElement::At | PathElement::Hash(_) | PathElement::Constant(_)
        )
    }

    /// Whether this computed element could claim the literal key `literal`
    ///
    /// Amp keys depend on the walk and are assumed to conflict.
    pub fn could_match_literal(&self, literal: &str) -> bool {
        match self {
            PathElement::StarAll | PathElement::Amp(_) => true,
            PathElement::StarSingle(star) => star.captures(literal).is_some(),
            PathElement::StarDouble(star) => star.captures(literal).is_some(),
            PathElement::StarRegex(star) => star.captures(literal).is_some(),
            _ => false,
        }
    }

    /// Sugar-free textual form
    pub fn canonical(&self) -> String {
        match self {
            PathElement::Literal(literal) => escape_key(literal),
            PathElement::StarAll => "*".to_string(),
            PathElement::StarSingle(star) => star.canonical(),
            PathElement::StarDouble(star) => star.canonical(),
            PathElement::StarRegex(star) => star.canonical(),
            PathElement::Amp(template) => template.canonical(),
            PathElement::Dollar(reference) => reference.canonical('$'),
            PathElement::At => "@".to_string(),
            PathElement::Hash(up) => format!("#({})", up),
            PathElement::Constant(text) => format!("#{}", escape_key(text)),
            PathElement::Transpose(transpose) => transpose.canonical(),
        }
    }

    /// Short variant name used in messages
    pub fn kind(&self) -> &'static str {
        match self {
            PathElement::Literal(_) => "literal",
            PathElement::StarAll => "star-all",
            PathElement::StarSingle(_) => "star-single",
            PathElement::StarDouble(_) => "star-double",
            PathElement::StarRegex(_) => "star-regex",
            PathElement::Amp(_) => "reference",
            PathElement::Dollar(_) => "dollar",
            PathElement::At => "at",
            PathElement::Hash(_) => "hash",
            PathElement::Constant(_) => "constant",
            PathElement::Transpose(_) => "transpose",
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Matching precedence of a variant; lower ranks are tried first
pub fn precedence_rank(element: &PathElement) -> u8 {
    match element {
        PathElement::Literal(_) => 0,
        PathElement::Amp(_) => 1,
        PathElement::StarAll | PathElement::StarSingle(_) | PathElement::StarDouble(_) | PathElement::StarRegex(_) => 2,
        PathElement::Dollar(_)
        | PathElement::At
        | PathElement::Hash(_)
        | PathElement::Constant(_)
        | PathElement::Transpose(_) => 3,
    }
}

/// Total order for computed siblings: rank, then longer canonical form
/// first, then alphabetical
pub fn compare_precedence(a: &PathElement, b: &PathElement) -> Ordering {
    let (a_canonical, b_canonical) = (a.canonical(), b.canonical());
    precedence_rank(a)
        .cmp(&precedence_rank(b))
        .then_with(|| b_canonical.len().cmp(&a_canonical.len()))
        .then_with(|| a_canonical.cmp(&b_canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walked::MatchedKey;

    fn parse(raw: &str) -> PathElement {
        PathElement::parse(raw).unwrap()
    }

    #[test]
    fn test_literal_and_star_matching() {
        let walked = WalkedPath::new();
        assert!(parse("foo").match_key("foo", &walked).is_some());
        assert!(parse("foo").match_key("food", &walked).is_none());
        assert!(parse("*").match_key("anything", &walked).is_some());

        let matched = parse("rating-*").match_key("rating-high", &walked).unwrap();
        assert_eq!(matched.group(1), Some("high"));
    }

    #[test]
    fn test_amp_matches_resolved_key() {
        let mut walked = WalkedPath::new();
        walked.push(MatchedKey::new("root"), None);
        walked.push(MatchedKey::with_captures("tag-a", vec!["a".into()]), None);

        assert!(parse("&(0,1)").match_key("a", &walked).is_some());
        assert!(parse("x-&").match_key("x-tag-a", &walked).is_some());
        assert!(parse("&5").match_key("a", &walked).is_none());
    }

    #[test]
    fn test_specials_never_match_keys() {
        let walked = WalkedPath::new();
        for raw in ["@", "$", "#", "#2", "#value", "@(1,a)"] {
            let element = parse(raw);
            assert!(element.is_special(), "{raw}");
            assert!(element.match_key("a", &walked).is_none(), "{raw}");
        }
    }

    #[test]
    fn test_conflict_detection() {
        assert!(parse("f*").could_match_literal("foo"));
        assert!(!parse("g*").could_match_literal("foo"));
        assert!(parse("*").could_match_literal("foo"));
        assert!(parse("&1").could_match_literal("foo"));
        assert!(!parse("foo").could_match_literal("foo"));
    }

    #[test]
    fn test_precedence_order() {
        let mut elements = vec![parse("*"), parse("a-*"), parse("&1"), parse("a-*-*"), parse("b-*")];
        elements.sort_by(compare_precedence);
        let order: Vec<String> = elements.iter().map(PathElement::canonical).collect();
        assert_eq!(order, vec!["&(1,0)", "a-*-*", "a-*", "b-*", "*"]);
    }
}
