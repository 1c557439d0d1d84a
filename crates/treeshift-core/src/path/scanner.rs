//! Character scanner shared by the key grammar and the write-path grammar
//!
//! Handles backslash escapes, `&`/`$` reference tails, balanced parentheses
//! and top-level splitting. Errors carry the character offset so callers can
//! point at the offending character.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::reference::Reference;

/// Characters with a meaning in keys or write paths
pub const SPECIAL_CHARS: &[char] = &['\\', '.', '*', '&', '$', '@', '#', '[', ']', '(', ')', '|'];

/// Escape every special character with a backslash
pub fn escape_key(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Drop escape backslashes, keeping the escaped characters
pub fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Scan failure with the character offset it occurred at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
    pub position: usize,
}

impl ScanError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Output of [`Scanner::scan_pieces`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Star,
    Reference(Reference),
}

/// Cursor over the characters of a key or path segment
pub struct Scanner {
    chars: Vec<char>,
    position: usize,
    /// Offset of this scanner's input inside the full raw string
    offset: usize,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        Self::with_offset(input, 0)
    }

    /// A scanner whose error positions are shifted by `offset`
    pub fn with_offset(input: &str, offset: usize) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            offset,
        }
    }

    pub fn current_char(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.current_char();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    /// Absolute position of the cursor
    pub fn position(&self) -> usize {
        self.offset + self.position
    }

    /// Everything from the cursor to the end
    pub fn rest(&self) -> String {
        self.chars[self.position.min(self.chars.len())..].iter().collect()
    }

    pub fn error(&self, message: impl Into<String>) -> ScanError {
        ScanError::new(message, self.position())
    }

    pub fn expect_char(&mut self, expected: char) -> Result<(), ScanError> {
        match self.current_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected `{}`, found `{}`", expected, ch))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    /// One or more ASCII digits
    pub fn parse_number(&mut self) -> Result<usize, ScanError> {
        let start = self.position();
        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            digits.push(ch);
            self.advance();
        }
        if digits.is_empty() {
            return Err(ScanError::new("expected a number", start));
        }
        digits
            .parse()
            .map_err(|_| ScanError::new(format!("number `{}` is too large", digits), start))
    }

    /// The part of a reference after its sigil: nothing, `N`, `(N)` or `(N,M)`
    pub fn parse_reference_tail(&mut self) -> Result<Reference, ScanError> {
        match self.current_char() {
            Some('(') => {
                self.advance();
                self.skip_whitespace();
                let path_index = self.parse_number()?;
                self.skip_whitespace();
                let mut group_index = 0;
                if self.current_char() == Some(',') {
                    self.advance();
                    self.skip_whitespace();
                    group_index = self.parse_number()?;
                    self.skip_whitespace();
                }
                self.expect_char(')')?;
                Ok(Reference::new(path_index, group_index))
            }
            Some(ch) if ch.is_ascii_digit() => Ok(Reference::new(self.parse_number()?, 0)),
            _ => Ok(Reference::default()),
        }
    }

    /// Consume a balanced `(...)` group and return its inner text, escapes kept
    pub fn take_parenthesized(&mut self) -> Result<String, ScanError> {
        let start = self.position();
        self.expect_char('(')?;
        let mut depth = 1usize;
        let mut inner = String::new();
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    inner.push(ch);
                    match self.advance() {
                        Some(escaped) => inner.push(escaped),
                        None => return Err(self.error("dangling escape character")),
                    }
                }
                '(' => {
                    depth += 1;
                    inner.push(ch);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(inner);
                    }
                    inner.push(ch);
                }
                _ => inner.push(ch),
            }
        }
        Err(ScanError::new("unclosed `(`", start))
    }

    /// Scan text, wildcards and `&` references until the end or an unescaped
    /// character in `stop_at`, which is left unconsumed
    pub fn scan_pieces(&mut self, allow_star: bool, stop_at: &[char]) -> Result<Vec<Piece>, ScanError> {
        let mut pieces = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.current_char() {
            if stop_at.contains(&ch) {
                break;
            }
            match ch {
                '\\' => {
                    self.advance();
                    match self.advance() {
                        Some(escaped) => text.push(escaped),
                        None => return Err(self.error("dangling escape character")),
                    }
                }
                '*' if allow_star => {
                    self.advance();
                    flush_text(&mut pieces, &mut text);
                    pieces.push(Piece::Star);
                }
                '*' => return Err(self.error("`*` is only valid in input keys")),
                '&' => {
                    self.advance();
                    flush_text(&mut pieces, &mut text);
                    pieces.push(Piece::Reference(self.parse_reference_tail()?));
                }
                '@' | '$' | '#' => {
                    return Err(self.error(format!("`{}` is only valid at the start of a key", ch)))
                }
                '[' => return Err(self.error("array indices are only valid in write paths")),
                ']' => return Err(self.error("unbalanced `]`")),
                '(' => return Err(self.error("`(` is only valid after a reference")),
                ')' => return Err(self.error("unbalanced `)`")),
                '|' => return Err(self.error("unexpected `|` outside an or-group")),
                _ => {
                    self.advance();
                    text.push(ch);
                }
            }
        }

        flush_text(&mut pieces, &mut text);
        Ok(pieces)
    }
}

fn flush_text(pieces: &mut Vec<Piece>, text: &mut String) {
    if !text.is_empty() {
        pieces.push(Piece::Text(std::mem::take(text)));
    }
}

/// Split on unescaped `separator` outside parentheses and brackets
///
/// Returns each part with its starting offset. Escapes are preserved in the
/// parts so they can be scanned again.
pub fn split_top_level(input: &str, separator: char) -> Result<Vec<(String, usize)>, ScanError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut parens: Vec<usize> = Vec::new();
    let mut brackets: Vec<usize> = Vec::new();
    let mut chars = input.chars().enumerate();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                match chars.next() {
                    Some((_, escaped)) => current.push(escaped),
                    None => return Err(ScanError::new("dangling escape character", index)),
                }
                continue;
            }
            '(' => parens.push(index),
            ')' => {
                if parens.pop().is_none() {
                    return Err(ScanError::new("unbalanced `)`", index));
                }
            }
            '[' => brackets.push(index),
            ']' => {
                if brackets.pop().is_none() {
                    return Err(ScanError::new("unbalanced `]`", index));
                }
            }
            _ if ch == separator && parens.is_empty() && brackets.is_empty() => {
                parts.push((std::mem::take(&mut current), start));
                start = index + 1;
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if let Some(&open) = parens.last() {
        return Err(ScanError::new("unclosed `(`", open));
    }
    if let Some(&open) = brackets.last() {
        return Err(ScanError::new("unclosed `[`", open));
    }

    parts.push((current, start));
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let raw = "a.b*c&d";
        let escaped = escape_key(raw);
        assert_eq!(escaped, "a\\.b\\*c\\&d");
        assert_eq!(unescape(&escaped), raw);
    }

    #[test]
    fn test_reference_tails() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.parse_reference_tail().unwrap(), Reference::new(0, 0));

        let mut scanner = Scanner::new("12x");
        assert_eq!(scanner.parse_reference_tail().unwrap(), Reference::new(12, 0));
        assert_eq!(scanner.rest(), "x");

        let mut scanner = Scanner::new("( 1 , 2 )");
        assert_eq!(scanner.parse_reference_tail().unwrap(), Reference::new(1, 2));

        let mut scanner = Scanner::new("(1,)");
        assert!(scanner.parse_reference_tail().is_err());
    }

    #[test]
    fn test_scan_pieces_with_escapes() {
        let mut scanner = Scanner::new("a\\*b*c&1");
        let pieces = scanner.scan_pieces(true, &[]).unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Text("a*b".into()),
                Piece::Star,
                Piece::Text("c".into()),
                Piece::Reference(Reference::new(1, 0)),
            ]
        );
    }

    #[test]
    fn test_scan_pieces_rejects_misplaced_sigils() {
        let err = Scanner::new("ab@c").scan_pieces(true, &[]).unwrap_err();
        assert_eq!(err.position, 2);

        let err = Scanner::new("x*").scan_pieces(false, &[]).unwrap_err();
        assert!(err.message.contains("input keys"));
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let parts = split_top_level("a.@(1,b.c).d[&(1,0)]", '.').unwrap();
        let texts: Vec<_> = parts.iter().map(|(text, _)| text.as_str()).collect();
        assert_eq!(texts, vec!["a", "@(1,b.c)", "d[&(1,0)]"]);
        assert_eq!(parts[1].1, 2);

        let parts = split_top_level("a\\|b|c", '|').unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, "a\\|b");
    }

    #[test]
    fn test_split_top_level_reports_unbalanced() {
        assert_eq!(split_top_level("a(b", '.').unwrap_err().position, 1);
        assert_eq!(split_top_level("a]b", '.').unwrap_err().position, 1);
    }

    #[test]
    fn test_take_parenthesized() {
        let mut scanner = Scanner::new("(1,a(b).c)rest");
        assert_eq!(scanner.take_parenthesized().unwrap(), "1,a(b).c");
        assert_eq!(scanner.rest(), "rest");
    }
}
