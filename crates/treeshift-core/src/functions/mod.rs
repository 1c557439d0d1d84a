//! Function registry for modify specs
//!
//! Functions are plain `fn(&[Value]) -> Option<Value>` pointers: pure, no
//! captured state, and `None` meaning "no result" so the caller skips the
//! write. The default registry holds the built-ins from [`builtin`].
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod builtin;

use serde_json::Value;
use std::collections::HashMap;

/// Signature shared by every registered function
pub type Function = fn(&[Value]) -> Option<Value>;

/// Name to function lookup table
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// A registry without any functions
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// A registry holding every built-in function
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, function) in builtin::BUILTINS {
            registry.register(*name, *function);
        }
        registry
    }

    /// Add or replace a function
    pub fn register(&mut self, name: impl Into<String>, function: Function) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<Function> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn always_seven(_: &[Value]) -> Option<Value> {
        Some(json!(7))
    }

    #[test]
    fn test_builtin_registry() {
        let registry = FunctionRegistry::default();
        assert!(registry.contains("toUpper"));
        assert!(registry.contains("squashNulls"));
        assert!(!registry.contains("noSuchFunction"));
        assert_eq!(registry.len(), builtin::BUILTINS.len());
    }

    #[test]
    fn test_register_custom_function() {
        let mut registry = FunctionRegistry::empty();
        assert!(registry.is_empty());
        registry.register("seven", always_seven);

        let function = registry.get("seven").unwrap();
        assert_eq!(function(&[]), Some(json!(7)));
        assert_eq!(registry.names(), vec!["seven"]);
    }
}
