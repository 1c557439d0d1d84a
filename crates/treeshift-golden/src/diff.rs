//! Diff engine for comparing JSON documents
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use colored::*;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

/// Options for diff comparison
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Whether to use colored output
    pub colored: bool,

    /// Tolerance for floating point comparison
    pub float_tolerance: f64,

    /// Compare lists as multisets; fan-in lists have no guaranteed order
    pub unordered_lists: bool,

    /// Maximum diff lines to show (0 = unlimited)
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            float_tolerance: 1e-9,
            unordered_lists: false,
            max_diff_lines: 100,
        }
    }
}

/// Result of a diff operation
#[derive(Debug)]
pub struct DiffResult {
    /// Whether the values match
    pub matches: bool,

    /// Human-readable diff output
    pub diff_output: String,

    /// Paths that differ
    pub differing_paths: Vec<String>,
}

/// Engine for comparing JSON values
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compare two JSON values
    pub fn compare(&self, expected: &Value, actual: &Value) -> DiffResult {
        if self.values_match(expected, actual) {
            return DiffResult {
                matches: true,
                diff_output: String::new(),
                differing_paths: Vec::new(),
            };
        }

        let mut differing_paths = Vec::new();
        self.collect_diff_paths(expected, actual, String::new(), &mut differing_paths);

        DiffResult {
            matches: false,
            diff_output: self.generate_diff_output(expected, actual),
            differing_paths,
        }
    }

    /// Check if two values match structurally
    pub fn values_match(&self, expected: &Value, actual: &Value) -> bool {
        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                exp.len() == act.len()
                    && exp
                        .iter()
                        .all(|(key, exp_val)| act.get(key).is_some_and(|act_val| self.values_match(exp_val, act_val)))
            }
            (Value::Array(exp), Value::Array(act)) if self.options.unordered_lists => {
                exp.len() == act.len() && self.match_unordered(exp, act)
            }
            (Value::Array(exp), Value::Array(act)) => {
                exp.len() == act.len()
                    && exp
                        .iter()
                        .zip(act.iter())
                        .all(|(exp_val, act_val)| self.values_match(exp_val, act_val))
            }
            (Value::Number(exp), Value::Number(act)) => match (exp.as_f64(), act.as_f64()) {
                (Some(exp_f), Some(act_f)) => (exp_f - act_f).abs() <= self.options.float_tolerance,
                _ => exp == act,
            },
            (exp, act) => exp == act,
        }
    }

    /// Every expected element paired with a distinct actual element
    fn match_unordered(&self, expected: &[Value], actual: &[Value]) -> bool {
        let mut used = vec![false; actual.len()];
        expected.iter().all(|exp_val| {
            let found = actual
                .iter()
                .enumerate()
                .position(|(index, act_val)| !used[index] && self.values_match(exp_val, act_val));
            match found {
                Some(index) => {
                    used[index] = true;
                    true
                }
                None => false,
            }
        })
    }

    /// Generate human-readable diff output
    fn generate_diff_output(&self, expected: &Value, actual: &Value) -> String {
        let expected_str = serde_json::to_string_pretty(expected).unwrap_or_default();
        let actual_str = serde_json::to_string_pretty(actual).unwrap_or_default();

        let text_diff = TextDiff::from_lines(&expected_str, &actual_str);
        let mut output = String::new();

        if self.options.colored {
            output.push_str(&"=== Diff Output (- expected, + actual) ===\n".bold().to_string());
        } else {
            output.push_str("=== Diff Output (- expected, + actual) ===\n");
        }

        for (line_count, change) in text_diff.iter_all_changes().enumerate() {
            if self.options.max_diff_lines > 0 && line_count >= self.options.max_diff_lines {
                output.push_str("... (diff truncated) ...\n");
                break;
            }

            let line = match change.tag() {
                ChangeTag::Delete if self.options.colored => format!("{}{}", "-".red(), change.to_string().red()),
                ChangeTag::Delete => format!("-{}", change),
                ChangeTag::Insert if self.options.colored => {
                    format!("{}{}", "+".green(), change.to_string().green())
                }
                ChangeTag::Insert => format!("+{}", change),
                ChangeTag::Equal => format!(" {}", change),
            };
            output.push_str(&line);
        }

        output
    }

    /// Recursively collect paths that differ
    fn collect_diff_paths(&self, expected: &Value, actual: &Value, path: String, paths: &mut Vec<String>) {
        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                let all_keys: BTreeSet<_> = exp.keys().chain(act.keys()).collect();

                for key in all_keys {
                    let new_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    match (exp.get(key), act.get(key)) {
                        (Some(exp_val), Some(act_val)) => {
                            if !self.values_match(exp_val, act_val) {
                                self.collect_diff_paths(exp_val, act_val, new_path, paths);
                            }
                        }
                        (Some(_), None) => paths.push(format!("{} (missing in actual)", new_path)),
                        (None, Some(_)) => paths.push(format!("{} (extra in actual)", new_path)),
                        (None, None) => {}
                    }
                }
            }
            (Value::Array(exp), Value::Array(act)) if !self.options.unordered_lists => {
                for (i, (exp_val, act_val)) in exp.iter().zip(act.iter()).enumerate() {
                    if !self.values_match(exp_val, act_val) {
                        self.collect_diff_paths(exp_val, act_val, format!("{}[{}]", path, i), paths);
                    }
                }

                if exp.len() != act.len() {
                    paths.push(format!("{} (list length mismatch: {} vs {})", path, exp.len(), act.len()));
                }
            }
            _ => {
                if !self.values_match(expected, actual) {
                    paths.push(if path.is_empty() { "<root>".to_string() } else { path });
                }
            }
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn plain() -> DiffEngine {
        DiffEngine::new(DiffOptions {
            colored: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_values_match_exact_and_float() {
        let engine = plain();
        assert!(engine.values_match(&json!({"a": 1, "b": "x"}), &json!({"a": 1, "b": "x"})));
        assert!(engine.values_match(&json!(2.0), &json!(2)));
        assert!(!engine.values_match(&json!({"a": 1}), &json!({"a": 2})));
    }

    #[test]
    fn test_unordered_lists() {
        let engine = DiffEngine::new(DiffOptions {
            unordered_lists: true,
            ..Default::default()
        });
        assert!(engine.values_match(&json!({"z": [1, 2]}), &json!({"z": [2, 1]})));
        assert!(!engine.values_match(&json!([1, 1]), &json!([1, 2])));
        assert!(!plain().values_match(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn test_differing_paths() {
        let result = plain().compare(
            &json!({"a": {"b": 1}, "list": [1, 2], "gone": true}),
            &json!({"a": {"b": 2}, "list": [1], "extra": null}),
        );

        assert!(!result.matches);
        assert_eq!(
            result.differing_paths,
            vec![
                "a.b",
                "extra (extra in actual)",
                "gone (missing in actual)",
                "list (list length mismatch: 2 vs 1)",
            ]
        );
        assert!(result.diff_output.contains("-    \"b\": 1"));
        assert!(result.diff_output.contains("+    \"b\": 2"));
    }

    #[test]
    fn test_root_mismatch() {
        let result = plain().compare(&json!(1), &Value::Null);
        assert_eq!(result.differing_paths, vec!["<root>"]);
    }
}
