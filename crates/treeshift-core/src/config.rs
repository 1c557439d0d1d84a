//! Engine configuration
//!
//! Settings that influence how specs are compiled. A config is usually built
//! with [`EngineConfig::default`] or loaded from an already parsed document
//! with [`EngineConfig::from_json`]; missing fields fall back to defaults.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default nesting limit for spec documents
pub const DEFAULT_MAX_SPEC_DEPTH: usize = 64;

/// Default name of the synthetic root segment
pub const DEFAULT_ROOT_KEY: &str = "root";

/// Compile-time settings shared by every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting depth of a spec document
    pub max_spec_depth: usize,

    /// Key of the synthetic root frame and root write segment
    pub root_key: String,

    /// Accept `=function(...)` expressions in modify specs
    pub functions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_spec_depth: DEFAULT_MAX_SPEC_DEPTH,
            root_key: DEFAULT_ROOT_KEY.to_string(),
            functions: true,
        }
    }
}

impl EngineConfig {
    /// Load a config from a parsed document and validate it
    pub fn from_json(value: &Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone()).map_err(|source| Error::Json {
            message: "failed to decode engine configuration".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the maximum spec depth
    pub fn with_max_spec_depth(mut self, depth: usize) -> Self {
        self.max_spec_depth = depth;
        self
    }

    /// Set the synthetic root key
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    /// Enable or disable function expressions
    pub fn with_functions(mut self, enabled: bool) -> Self {
        self.functions = enabled;
        self
    }

    /// Check the settings for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_spec_depth == 0 {
            return Err(Error::Configuration {
                message: "max_spec_depth must be at least 1".to_string(),
                field: Some("max_spec_depth".to_string()),
            });
        }
        if self.root_key.is_empty() {
            return Err(Error::Configuration {
                message: "root_key must not be empty".to_string(),
                field: Some("root_key".to_string()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_spec_depth, 64);
        assert_eq!(config.root_key, "root");
        assert!(config.functions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = EngineConfig::from_json(&json!({"root_key": "doc"})).unwrap();
        assert_eq!(config.root_key, "doc");
        assert_eq!(config.max_spec_depth, DEFAULT_MAX_SPEC_DEPTH);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = EngineConfig::from_json(&json!({"max_spec_depth": 0})).unwrap_err();
        assert!(matches!(err, Error::Configuration { field: Some(ref f), .. } if f == "max_spec_depth"));

        let err = EngineConfig::from_json(&json!({"functions": "yes"})).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
