//! Back-references and reference templates
//!
//! A [`Reference`] addresses a frame of the [`WalkedPath`] (counted down from
//! the top) and one capture group of the key matched there. A [`Template`] is
//! literal text interleaved with `&` references, used for LHS keys such as
//! `&1-suffix` and for every key segment of a write path.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::scanner::{escape_key, Piece};
use crate::walked::WalkedPath;
use std::fmt;

/// `(pathIndex, groupIndex)` pair behind `&`, `&1`, `&(1,2)`, `$`, `$(0,1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Reference {
    /// Frames to walk down from the top of the walked path
    pub path_index: usize,
    /// Capture group of the matched key; 0 is the whole key
    pub group_index: usize,
}

impl Reference {
    pub fn new(path_index: usize, group_index: usize) -> Self {
        Self {
            path_index,
            group_index,
        }
    }

    /// Resolve against the walked path; `None` when the frame or group is absent
    pub fn resolve<'w>(&self, walked: &'w WalkedPath<'_>) -> Option<&'w str> {
        walked
            .from_top(self.path_index)?
            .matched()
            .group(self.group_index)
    }

    /// Fully parameterized form, e.g. `&(1,0)` for `&1`
    pub fn canonical(&self, sigil: char) -> String {
        format!("{}({},{})", sigil, self.path_index, self.group_index)
    }
}

/// A piece of a [`Template`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Reference(Reference),
}

/// Literal text interleaved with `&` references
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Build a template, merging adjacent text segments
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut merged: Vec<Segment> = Vec::new();
        for segment in segments {
            match (merged.last_mut(), segment) {
                (Some(Segment::Text(previous)), Segment::Text(text)) => previous.push_str(&text),
                (_, Segment::Text(text)) if text.is_empty() => {}
                (_, segment) => merged.push(segment),
            }
        }
        Self { segments: merged }
    }

    /// Convert scanner output; wildcards are not part of templates
    pub(crate) fn from_pieces(pieces: Vec<Piece>) -> Self {
        Self::from_segments(pieces.into_iter().filter_map(|piece| match piece {
            Piece::Text(text) => Some(Segment::Text(text)),
            Piece::Reference(reference) => Some(Segment::Reference(reference)),
            Piece::Star => None,
        }))
    }

    /// A template without references
    pub fn literal(text: impl Into<String>) -> Self {
        Self::from_segments([Segment::Text(text.into())])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_references(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Reference(_)))
    }

    /// The text of a reference-free template
    pub fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Text(text)] => Some(text),
            _ => None,
        }
    }

    /// Substitute every reference; `None` if any of them cannot be resolved
    pub fn resolve(&self, walked: &WalkedPath<'_>) -> Option<String> {
        let mut resolved = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => resolved.push_str(text),
                Segment::Reference(reference) => resolved.push_str(reference.resolve(walked)?),
            }
        }
        Some(resolved)
    }

    /// Escaped text with every reference in `&(p,g)` form
    pub fn canonical(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => escape_key(text),
                Segment::Reference(reference) => reference.canonical('&'),
            })
            .collect()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walked::MatchedKey;

    fn walked_with(keys: &[MatchedKey]) -> WalkedPath<'static> {
        let mut walked = WalkedPath::new();
        for key in keys {
            walked.push(key.clone(), None);
        }
        walked
    }

    #[test]
    fn test_reference_resolves_frames_and_groups() {
        let walked = walked_with(&[
            MatchedKey::new("root"),
            MatchedKey::with_captures("tag-red-large", vec!["red".into(), "large".into()]),
            MatchedKey::new("value"),
        ]);

        assert_eq!(Reference::new(0, 0).resolve(&walked), Some("value"));
        assert_eq!(Reference::new(1, 0).resolve(&walked), Some("tag-red-large"));
        assert_eq!(Reference::new(1, 2).resolve(&walked), Some("large"));
        assert_eq!(Reference::new(1, 3).resolve(&walked), None);
        assert_eq!(Reference::new(5, 0).resolve(&walked), None);
    }

    #[test]
    fn test_template_merges_text_and_resolves() {
        let template = Template::from_segments([
            Segment::Text("item-".into()),
            Segment::Text("".into()),
            Segment::Reference(Reference::new(1, 0)),
            Segment::Text(".x".into()),
        ]);
        assert_eq!(template.segments().len(), 3);
        assert_eq!(template.canonical(), "item-&(1,0)\\.x");

        let walked = walked_with(&[MatchedKey::new("root"), MatchedKey::new("a"), MatchedKey::new("b")]);
        assert_eq!(template.resolve(&walked).as_deref(), Some("item-a.x"));
    }

    #[test]
    fn test_literal_template() {
        let template = Template::literal("plain");
        assert!(!template.has_references());
        assert_eq!(template.as_literal(), Some("plain"));
        assert_eq!(Template::default().as_literal(), Some(""));
    }
}
