//! Error types for the treeshift engine
//!
//! Compile-time problems with a spec are reported as [`SpecError`], which
//! always names the offending key and, once the spec tree builder has seen
//! it, the dotted location of the spec node. Transform-time resolution misses
//! are not errors at all; they are ordinary `Option::None` values inside the
//! walker.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while compiling a spec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Malformed left-hand-side key
    #[error("Invalid key '{key}'{}: {message}", location_suffix(.location))]
    InvalidKey {
        key: String,
        location: String,
        message: String,
        position: Option<usize>,
    },

    /// Malformed right-hand-side write path
    #[error("Invalid write path '{path}'{}: {message}", location_suffix(.location))]
    InvalidWritePath {
        path: String,
        location: String,
        message: String,
        position: Option<usize>,
    },

    /// Two sibling keys share a canonical form
    #[error("Duplicate key{}: '{first}' and '{second}' both canonicalize to '{canonical}'", location_suffix(.location))]
    DuplicateKey {
        first: String,
        second: String,
        canonical: String,
        location: String,
    },

    /// `@`, `$` or `#` given a nested spec
    #[error("Key '{key}'{} cannot have children", location_suffix(.location))]
    SpecialWithChildren { key: String, location: String },

    /// A nested spec without any keys
    #[error("Key '{key}'{} has an empty spec", location_suffix(.location))]
    EmptyContainer { key: String, location: String },

    /// A child of an array spec (`key[]`) that is not an index or wildcard
    #[error("Key '{key}'{} is not an integer index of an array spec", location_suffix(.location))]
    InvalidArrayKey { key: String, location: String },

    /// A right-hand-side value the operation does not accept
    #[error("Invalid value{}: {message}", location_suffix(.location))]
    InvalidValue { location: String, message: String },

    /// A function call naming no registered function
    #[error("Unknown function '{name}'{}", location_suffix(.location))]
    UnknownFunction { name: String, location: String },

    /// Spec nesting beyond the configured limit
    #[error("Spec nested deeper than {limit} levels{}", location_suffix(.location))]
    TooDeep { limit: usize, location: String },

    /// Malformed chain document
    #[error("Invalid chain entry {index}: {message}")]
    InvalidChain { index: usize, message: String },
}

fn location_suffix(location: &str) -> String {
    if location.is_empty() {
        String::new()
    } else {
        format!(" at {}", location)
    }
}

impl SpecError {
    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, message: impl Into<String>, position: Option<usize>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            location: String::new(),
            message: message.into(),
            position,
        }
    }

    /// Create an invalid write path error
    pub fn invalid_write_path(
        path: impl Into<String>,
        message: impl Into<String>,
        position: Option<usize>,
    ) -> Self {
        Self::InvalidWritePath {
            path: path.into(),
            location: String::new(),
            message: message.into(),
            position,
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Attach the spec location if none has been recorded yet
    pub fn at(mut self, spec_location: &str) -> Self {
        let slot = match &mut self {
            Self::InvalidKey { location, .. }
            | Self::InvalidWritePath { location, .. }
            | Self::DuplicateKey { location, .. }
            | Self::SpecialWithChildren { location, .. }
            | Self::EmptyContainer { location, .. }
            | Self::InvalidArrayKey { location, .. }
            | Self::InvalidValue { location, .. }
            | Self::UnknownFunction { location, .. }
            | Self::TooDeep { location, .. } => Some(location),
            Self::InvalidChain { .. } => None,
        };
        if let Some(location) = slot {
            if location.is_empty() {
                *location = spec_location.to_string();
            }
        }
        self
    }

    /// Dotted location of the failing spec node, when known
    pub fn location(&self) -> Option<&str> {
        let location = match self {
            Self::InvalidKey { location, .. }
            | Self::InvalidWritePath { location, .. }
            | Self::DuplicateKey { location, .. }
            | Self::SpecialWithChildren { location, .. }
            | Self::EmptyContainer { location, .. }
            | Self::InvalidArrayKey { location, .. }
            | Self::InvalidValue { location, .. }
            | Self::UnknownFunction { location, .. }
            | Self::TooDeep { location, .. } => location,
            Self::InvalidChain { .. } => return None,
        };
        (!location.is_empty()).then_some(location.as_str())
    }

    /// The raw key or write path the error is about
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidKey { key, .. }
            | Self::SpecialWithChildren { key, .. }
            | Self::EmptyContainer { key, .. }
            | Self::InvalidArrayKey { key, .. } => Some(key),
            Self::InvalidWritePath { path, .. } => Some(path),
            Self::DuplicateKey { second, .. } => Some(second),
            Self::UnknownFunction { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Error message with a caret under the offending character
    pub fn detailed_message(&self) -> String {
        let (input, position) = match self {
            Self::InvalidKey { key, position: Some(position), .. } => (key, *position),
            Self::InvalidWritePath { path, position: Some(position), .. } => (path, *position),
            _ => return self.to_string(),
        };

        let mut result = self.to_string();
        result.push_str(&format!("\n  {}", input));
        if position <= input.chars().count() {
            result.push_str(&format!("\n  {}^", " ".repeat(position)));
        }
        result
    }
}

/// Main error type for treeshift operations
#[derive(Error, Debug)]
pub enum Error {
    /// A spec failed to compile
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// One operation of a chain failed to compile
    #[error("Chain step {index} ({operation}) failed to compile: {source}")]
    ChainStep {
        index: usize,
        operation: String,
        #[source]
        source: SpecError,
    },

    /// A tree could not be decoded into a typed document
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Engine configuration rejected by validation
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_is_attached_once() {
        let err = SpecError::invalid_key("a@b", "`@` is only valid at the start of a key", Some(1))
            .at("rating.a@b")
            .at("ignored");
        assert_eq!(err.location(), Some("rating.a@b"));
        assert_eq!(err.key(), Some("a@b"));
        assert!(err.to_string().contains("at rating.a@b"));
    }

    #[test]
    fn test_message_without_location() {
        let err = SpecError::invalid_write_path("a..b", "empty path segment", Some(2));
        assert_eq!(err.location(), None);
        assert_eq!(err.to_string(), "Invalid write path 'a..b': empty path segment");
    }

    #[test]
    fn test_detailed_message_points_at_position() {
        let err = SpecError::invalid_key("ab*&", "cannot mix `*` and `&` in one key", Some(3));
        let detailed = err.detailed_message();
        assert!(detailed.contains("\n  ab*&"));
        assert!(detailed.ends_with("\n     ^"));
    }

    #[test]
    fn test_chain_error_wraps_spec_error() {
        let err = Error::ChainStep {
            index: 2,
            operation: "shift".to_string(),
            source: SpecError::EmptyContainer {
                key: "a".to_string(),
                location: "a".to_string(),
            },
        };
        assert!(err.to_string().starts_with("Chain step 2 (shift)"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
