//! Golden test infrastructure for the treeshift engine
//!
//! A golden fixture is one JSON file holding an operation, its spec, an
//! input document and the document the operation must produce. The corpus
//! is a directory tree of such files; subdirectories become categories.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod corpus;
pub mod diff;
pub mod runner;

use std::path::PathBuf;
use thiserror::Error;

pub use corpus::{CorpusManager, Fixture};
pub use diff::{DiffEngine, DiffOptions};
pub use runner::{check_inline, GoldenTestRunner, TestResult};

/// Golden test error types
#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corpus error: {0}")]
    CorpusError(String),

    #[error("Test failed: {0}")]
    TestFailed(String),
}

pub type Result<T> = std::result::Result<T, GoldenError>;

/// Configuration for golden tests
#[derive(Debug, Clone)]
pub struct GoldenConfig {
    /// Root directory of the fixture corpus
    pub corpus_dir: PathBuf,

    /// Diff options
    pub diff_options: DiffOptions,

    /// Verbose output
    pub verbose: bool,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("tests/corpus"),
            diff_options: DiffOptions::default(),
            verbose: false,
        }
    }
}

impl GoldenConfig {
    /// Create config from environment and defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(corpus_dir) = std::env::var("GOLDEN_CORPUS_DIR") {
            config.corpus_dir = PathBuf::from(corpus_dir);
        }

        if let Ok(verbose) = std::env::var("GOLDEN_VERBOSE") {
            config.verbose = verbose == "1" || verbose.eq_ignore_ascii_case("true");
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.diff_options.colored = false;
        }

        config
    }

    pub fn with_corpus_dir(mut self, corpus_dir: impl Into<PathBuf>) -> Self {
        self.corpus_dir = corpus_dir.into();
        self
    }
}

/// Define a test running one fixture, named relative to the corpus root
#[macro_export]
macro_rules! golden_test {
    ($name:ident, $fixture:expr) => {
        #[test]
        fn $name() {
            use $crate::{GoldenConfig, GoldenTestRunner};

            let runner = GoldenTestRunner::new(GoldenConfig::from_env());
            if let Err(e) = runner.run_test($fixture) {
                panic!("Golden test failed: {}: {}", $fixture, e);
            }
        }
    };
}

/// Define a test running every fixture whose name or category contains a pattern
#[macro_export]
macro_rules! golden_test_batch {
    ($name:ident, $pattern:expr) => {
        #[test]
        fn $name() {
            use $crate::{GoldenConfig, GoldenTestRunner};

            let runner = GoldenTestRunner::new(GoldenConfig::from_env());
            if let Err(e) = runner.run_batch($pattern) {
                panic!("Golden test batch failed: {}: {}", $pattern, e);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GoldenConfig::default().with_corpus_dir("fixtures");
        assert_eq!(config.corpus_dir, PathBuf::from("fixtures"));
        assert!(!config.verbose);
    }
}
