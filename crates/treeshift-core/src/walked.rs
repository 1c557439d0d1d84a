//! Runtime stack of matched ancestor frames
//!
//! Every level of the input tree that a spec node matches pushes one frame.
//! Back-references (`&`, `$`, `#`, `@(...)`) are resolved against this stack
//! by counting frames down from the top.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

/// A key accepted by a path element, together with its glob captures
///
/// Group 0 is always the whole key; groups 1.. are the segments captured by
/// the wildcards of a star pattern, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedKey {
    raw: String,
    captures: Vec<String>,
}

impl MatchedKey {
    /// A match without wildcard captures
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            captures: Vec::new(),
        }
    }

    /// A match produced by a star pattern
    pub fn with_captures(raw: impl Into<String>, captures: Vec<String>) -> Self {
        Self {
            raw: raw.into(),
            captures,
        }
    }

    /// The whole matched key
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Capture group `index`, where 0 is the whole key
    pub fn group(&self, index: usize) -> Option<&str> {
        if index == 0 {
            Some(&self.raw)
        } else {
            self.captures.get(index - 1).map(String::as_str)
        }
    }

    /// Number of wildcard captures
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }
}

/// One open level of the walk
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    matched: MatchedKey,
    count: usize,
    input: Option<&'a Value>,
}

impl<'a> Frame<'a> {
    /// The key this level matched
    pub fn matched(&self) -> &MatchedKey {
        &self.matched
    }

    /// How many children of this level have matched so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// The input sub-tree visited at this level, if it exists in the input
    pub fn input(&self) -> Option<&'a Value> {
        self.input
    }
}

/// Stack of frames for the levels currently being visited
#[derive(Debug, Clone, Default)]
pub struct WalkedPath<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> WalkedPath<'a> {
    /// Create an empty path
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Open a new level with a zero match count
    pub fn push(&mut self, matched: MatchedKey, input: Option<&'a Value>) {
        self.frames.push(Frame {
            matched,
            count: 0,
            input,
        });
    }

    /// Close the innermost level
    pub fn pop(&mut self) -> Option<Frame<'a>> {
        self.frames.pop()
    }

    /// Record a successful child match on the innermost level
    pub fn increment_top(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
        }
    }

    /// The frame `index` levels below the top; 0 is the innermost level
    pub fn from_top(&self, index: usize) -> Option<&Frame<'a>> {
        let len = self.frames.len();
        if index >= len {
            return None;
        }
        self.frames.get(len - 1 - index)
    }

    /// Number of open levels
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The matched keys from the outermost to the innermost level
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.matched.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_zero_is_whole_key() {
        let matched = MatchedKey::with_captures("rating-high", vec!["high".to_string()]);
        assert_eq!(matched.group(0), Some("rating-high"));
        assert_eq!(matched.group(1), Some("high"));
        assert_eq!(matched.group(2), None);
        assert_eq!(matched.capture_count(), 1);
    }

    #[test]
    fn test_from_top_counts_down() {
        let input = json!({"a": 1});
        let mut walked = WalkedPath::new();
        walked.push(MatchedKey::new("root"), Some(&input));
        walked.push(MatchedKey::new("a"), input.get("a"));

        assert_eq!(walked.from_top(0).map(|f| f.matched().raw()), Some("a"));
        assert_eq!(walked.from_top(1).map(|f| f.matched().raw()), Some("root"));
        assert!(walked.from_top(2).is_none());
        assert_eq!(walked.from_top(0).and_then(|f| f.input()), Some(&json!(1)));
    }

    #[test]
    fn test_pop_then_increment_parent() {
        let mut walked = WalkedPath::new();
        walked.push(MatchedKey::new("root"), None);
        walked.push(MatchedKey::new("0"), None);
        walked.pop();
        walked.increment_top();
        walked.push(MatchedKey::new("1"), None);
        walked.pop();
        walked.increment_top();

        assert_eq!(walked.depth(), 1);
        assert_eq!(walked.from_top(0).map(Frame::count), Some(2));
        assert_eq!(walked.keys().collect::<Vec<_>>(), vec!["root"]);
    }
}
