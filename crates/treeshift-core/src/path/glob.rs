//! Star patterns with captured wildcard segments
//!
//! Every `*` must match at least one character. One- and two-star patterns
//! are matched with plain string operations; longer patterns compile to an
//! anchored regex with one lazy group per star.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::scanner::escape_key;
use regex::Regex;

/// `prefix*suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarSingle {
    prefix: String,
    suffix: String,
}

impl StarSingle {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn captures(&self, key: &str) -> Option<Vec<String>> {
        if key.len() <= self.prefix.len() + self.suffix.len()
            || !key.starts_with(&self.prefix)
            || !key.ends_with(&self.suffix)
        {
            return None;
        }
        let middle = &key[self.prefix.len()..key.len() - self.suffix.len()];
        Some(vec![middle.to_string()])
    }

    pub fn canonical(&self) -> String {
        format!("{}*{}", escape_key(&self.prefix), escape_key(&self.suffix))
    }
}

/// `prefix*mid*suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarDouble {
    prefix: String,
    mid: String,
    suffix: String,
}

impl StarDouble {
    pub fn new(prefix: impl Into<String>, mid: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mid: mid.into(),
            suffix: suffix.into(),
        }
    }

    /// Leftmost split where both stars capture at least one character
    pub fn captures(&self, key: &str) -> Option<Vec<String>> {
        let fixed = self.prefix.len() + self.mid.len() + self.suffix.len();
        if key.len() < fixed + 2 || !key.starts_with(&self.prefix) || !key.ends_with(&self.suffix) {
            return None;
        }
        let middle = &key[self.prefix.len()..key.len() - self.suffix.len()];

        middle
            .char_indices()
            .skip(1)
            .map(|(index, _)| index)
            .find(|&index| {
                middle[index..].starts_with(&self.mid) && index + self.mid.len() < middle.len()
            })
            .map(|index| {
                vec![
                    middle[..index].to_string(),
                    middle[index + self.mid.len()..].to_string(),
                ]
            })
    }

    pub fn canonical(&self) -> String {
        format!(
            "{}*{}*{}",
            escape_key(&self.prefix),
            escape_key(&self.mid),
            escape_key(&self.suffix)
        )
    }
}

/// Three or more stars, matched through an anchored regex
#[derive(Debug, Clone)]
pub struct StarRegex {
    canonical: String,
    regex: Regex,
}

impl StarRegex {
    /// Build from the literal parts between the stars (`parts.len()` = stars + 1)
    pub fn new(parts: &[String]) -> Result<Self, regex::Error> {
        let mut pattern = String::from("^");
        let mut canonical = String::new();
        for (index, part) in parts.iter().enumerate() {
            if index > 0 {
                pattern.push_str("(.+?)");
                canonical.push('*');
            }
            pattern.push_str(&regex::escape(part));
            canonical.push_str(&escape_key(part));
        }
        pattern.push('$');

        Ok(Self {
            canonical,
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn captures(&self, key: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(key)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }

    pub fn canonical(&self) -> String {
        self.canonical.clone()
    }
}

impl PartialEq for StarRegex {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for StarRegex {}
