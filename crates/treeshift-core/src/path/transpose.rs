//! `@(up,path)` lookups into the input recorded on the walked path
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::scanner::{ScanError, Scanner};
use crate::output::{self, traversal, Step};
use crate::walked::WalkedPath;
use serde_json::Value;

/// Read-only dereference of a sub-path, starting from the input of the frame
/// `up` levels below the top of the walked path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transpose {
    up: usize,
    steps: Vec<Step>,
}

impl Transpose {
    pub fn new(up: usize, steps: Vec<Step>) -> Self {
        Self { up, steps }
    }

    /// Parse a complete `@...` string
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let mut scanner = Scanner::new(raw);
        let transpose = Self::scan(&mut scanner)?;
        if !scanner.is_at_end() {
            return Err(scanner.error("unexpected characters after lookup"));
        }
        Ok(transpose)
    }

    /// Scan `@`, `@name` or `@(up,path)` at the cursor
    ///
    /// A bare name runs until the end of input or an unescaped bracket.
    pub fn scan(scanner: &mut Scanner) -> Result<Self, ScanError> {
        scanner.expect_char('@')?;
        match scanner.current_char() {
            None | Some('[') | Some(']') => Ok(Self::new(0, Vec::new())),
            Some('(') => {
                let offset = scanner.position() + 1;
                let inner = scanner.take_parenthesized()?;
                Self::parse_inner(&inner, offset)
            }
            Some(_) => {
                let offset = scanner.position();
                let mut name = String::new();
                while let Some(ch) = scanner.current_char() {
                    if ch == '[' || ch == ']' {
                        break;
                    }
                    scanner.advance();
                    name.push(ch);
                    if ch == '\\' {
                        match scanner.advance() {
                            Some(escaped) => name.push(escaped),
                            None => return Err(scanner.error("dangling escape character")),
                        }
                    }
                }
                Ok(Self::new(0, output::parse_steps(&name, offset)?))
            }
        }
    }

    /// `N`, `N,path` or `path`
    fn parse_inner(inner: &str, offset: usize) -> Result<Self, ScanError> {
        let digits: String = inner.chars().take_while(|ch| ch.is_ascii_digit()).collect();
        let rest = &inner[digits.len()..];

        if digits.is_empty() || !(rest.is_empty() || rest.trim_start().starts_with(',')) {
            return Ok(Self::new(0, output::parse_steps(inner.trim(), offset)?));
        }

        let up = digits
            .parse()
            .map_err(|_| ScanError::new(format!("number `{}` is too large", digits), offset))?;
        let path = rest.trim_start().strip_prefix(',').unwrap_or("");
        let path_offset = offset + (inner.len() - path.len());
        Ok(Self::new(up, output::parse_steps(path.trim(), path_offset)?))
    }

    /// Levels below the top of the walked path where the lookup starts
    pub fn up(&self) -> usize {
        self.up
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolve against the walked path; `None` when anything along the way is missing
    pub fn lookup<'a>(&self, walked: &WalkedPath<'a>) -> Option<&'a Value> {
        let base = walked.from_top(self.up)?.input()?;
        let steps = output::resolve_steps(&self.steps, walked)?;
        traversal::get(base, &steps)
    }

    /// `@(up,path)` with every reference fully parameterized
    pub fn canonical(&self) -> String {
        format!("@({},{})", self.up, output::canonical_steps(&self.steps))
    }
}
