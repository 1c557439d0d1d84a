//! Parser for left-hand-side spec keys
//!
//! Or-groups (`a|b`) are expanded by [`split_alternatives`] before any key
//! reaches [`parse_key`]. A composite key may end in `[]` to declare that the
//! level it matches is a list; [`strip_array_marker`] removes that marker.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::element::PathElement;
use super::glob::{StarDouble, StarRegex, StarSingle};
use super::reference::Template;
use super::scanner::{split_top_level, unescape, Piece, ScanError, Scanner};
use super::transpose::Transpose;
use crate::error::SpecError;

fn key_error(raw: &str, error: ScanError) -> SpecError {
    SpecError::invalid_key(raw, error.message, Some(error.position))
}

/// Split an or-group key on unescaped `|` outside parentheses
pub fn split_alternatives(raw: &str) -> Result<Vec<String>, SpecError> {
    let parts = split_top_level(raw, '|').map_err(|e| key_error(raw, e))?;
    if parts.len() == 1 {
        return Ok(vec![raw.to_string()]);
    }
    parts
        .into_iter()
        .map(|(part, start)| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                Err(SpecError::invalid_key(raw, "empty alternative in or-group", Some(start)))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Remove a trailing unescaped `[]`, reporting whether it was present
pub fn strip_array_marker(raw: &str) -> (&str, bool) {
    match raw.strip_suffix("[]") {
        Some(stripped) if !ends_with_escape(stripped) => (stripped, true),
        _ => (raw, false),
    }
}

fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|&ch| ch == '\\').count() % 2 == 1
}

/// Parse one key into its path element
pub fn parse_key(raw: &str) -> Result<PathElement, SpecError> {
    match raw {
        "*" => return Ok(PathElement::StarAll),
        "@" => return Ok(PathElement::At),
        _ => {}
    }

    let mut scanner = Scanner::new(raw);
    match scanner.current_char() {
        Some('@') => Transpose::parse(raw)
            .map(PathElement::Transpose)
            .map_err(|e| key_error(raw, e)),
        Some('$') => {
            scanner.advance();
            let reference = scanner.parse_reference_tail().map_err(|e| key_error(raw, e))?;
            if !scanner.is_at_end() {
                return Err(key_error(raw, scanner.error("unexpected characters after `$` reference")));
            }
            Ok(PathElement::Dollar(reference))
        }
        Some('#') => parse_hash(raw, &mut scanner),
        _ => parse_pattern(raw, &mut scanner),
    }
}

/// `#`, `#N`, `#(N)` count the matches of a level; `#text` is a constant
fn parse_hash(raw: &str, scanner: &mut Scanner) -> Result<PathElement, SpecError> {
    scanner.advance();
    let rest = scanner.rest();
    let is_count = rest.is_empty()
        || rest.chars().all(|ch| ch.is_ascii_digit())
        || (rest.starts_with('(') && rest.ends_with(')'));
    if !is_count {
        return Ok(PathElement::Constant(unescape(&rest)));
    }

    let reference = scanner.parse_reference_tail().map_err(|e| key_error(raw, e))?;
    if reference.group_index != 0 || !scanner.is_at_end() {
        return Err(SpecError::invalid_key(raw, "`#` takes a single level argument", Some(1)));
    }
    Ok(PathElement::Hash(reference.path_index))
}

fn parse_pattern(raw: &str, scanner: &mut Scanner) -> Result<PathElement, SpecError> {
    let pieces = scanner.scan_pieces(true, &[]).map_err(|e| key_error(raw, e))?;

    let stars = pieces.iter().filter(|piece| matches!(piece, Piece::Star)).count();
    let has_references = pieces.iter().any(|piece| matches!(piece, Piece::Reference(_)));

    if stars > 0 && has_references {
        return Err(SpecError::invalid_key(
            raw,
            "cannot mix `*` and `&` in one key",
            find_unescaped(raw, '&'),
        ));
    }
    if has_references {
        return Ok(PathElement::Amp(Template::from_pieces(pieces)));
    }
    if stars == 0 {
        let literal = pieces
            .into_iter()
            .filter_map(|piece| match piece {
                Piece::Text(text) => Some(text),
                _ => None,
            })
            .collect();
        return Ok(PathElement::Literal(literal));
    }

    let mut parts = vec![String::new()];
    for piece in pieces {
        match piece {
            Piece::Star => {
                if parts.last().is_some_and(String::is_empty) && parts.len() > 1 {
                    return Err(SpecError::invalid_key(raw, "consecutive `*` wildcards", find_unescaped(raw, '*')));
                }
                parts.push(String::new());
            }
            Piece::Text(text) => {
                if let Some(last) = parts.last_mut() {
                    last.push_str(&text);
                }
            }
            Piece::Reference(_) => {}
        }
    }

    match parts.as_slice() {
        [prefix, suffix] if prefix.is_empty() && suffix.is_empty() => Ok(PathElement::StarAll),
        [prefix, suffix] => Ok(PathElement::StarSingle(StarSingle::new(prefix.clone(), suffix.clone()))),
        [prefix, mid, suffix] => Ok(PathElement::StarDouble(StarDouble::new(
            prefix.clone(),
            mid.clone(),
            suffix.clone(),
        ))),
        _ => StarRegex::new(&parts)
            .map(PathElement::StarRegex)
            .map_err(|e| SpecError::invalid_key(raw, format!("unsupported wildcard pattern: {}", e), None)),
    }
}

fn find_unescaped(raw: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (index, ch) in raw.chars().enumerate() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == target {
            return Some(index);
        }
    }
    None
}
