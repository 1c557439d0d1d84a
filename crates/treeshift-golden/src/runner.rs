//! Golden test runner
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::{
    corpus::{CorpusManager, Fixture},
    diff::{DiffEngine, DiffOptions},
    GoldenConfig, GoldenError, Result,
};
use colored::*;
use serde_json::{json, Value};
use std::time::Instant;
use treeshift_core::{Chain, Transform};

/// Result of running one fixture
#[derive(Debug)]
pub struct TestResult {
    /// `category/name` of the fixture
    pub name: String,

    /// Whether the fixture passed
    pub passed: bool,

    /// Error message if failed
    pub error: Option<String>,

    /// Diff output if comparison failed
    pub diff: Option<String>,

    /// Execution time in milliseconds
    pub duration_ms: u64,
}

impl TestResult {
    /// Print the test result
    pub fn print(&self, verbose: bool) {
        let status = if self.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!("{} {} ({}ms)", status, self.name, self.duration_ms);

        if let Some(ref error) = self.error {
            println!("  {}: {}", "Error".red(), error);
        }

        if verbose || !self.passed {
            if let Some(ref diff) = self.diff {
                println!("{}", diff);
            }
        }
    }
}

/// Runner for golden fixtures
pub struct GoldenTestRunner {
    config: GoldenConfig,
    corpus_manager: CorpusManager,
}

impl GoldenTestRunner {
    pub fn new(config: GoldenConfig) -> Self {
        let corpus_manager = CorpusManager::new(&config.corpus_dir);
        Self { config, corpus_manager }
    }

    /// Run a single fixture by id
    pub fn run_test(&self, id: &str) -> Result<TestResult> {
        let fixture = self.corpus_manager.load_by_id(id)?;
        let result = self.run_fixture(&fixture);

        if self.config.verbose {
            result.print(true);
        }

        if result.passed {
            Ok(result)
        } else {
            Err(GoldenError::TestFailed(format!(
                "Fixture '{}' failed: {}{}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error"),
                result.diff.as_deref().map(|diff| format!("\n{}", diff)).unwrap_or_default()
            )))
        }
    }

    /// Run every fixture whose id contains `pattern`
    pub fn run_batch(&self, pattern: &str) -> Result<Vec<TestResult>> {
        let fixtures = self.corpus_manager.filter(self.corpus_manager.discover()?, pattern);

        if fixtures.is_empty() {
            return Err(GoldenError::CorpusError(format!(
                "No fixtures found matching pattern '{}' in {}",
                pattern,
                self.corpus_manager.corpus_dir().display()
            )));
        }

        println!("Running {} fixtures...\n", fixtures.len());

        let results: Vec<TestResult> = fixtures.iter().map(|fixture| self.run_fixture(fixture)).collect();
        for result in &results {
            result.print(self.config.verbose);
        }

        let failed = results.iter().filter(|result| !result.passed).count();
        println!("\n{}", "=== Test Summary ===".bold());
        println!(
            "{}: {} passed, {} failed",
            "Results".bold(),
            (results.len() - failed).to_string().green(),
            failed.to_string().red()
        );

        if failed > 0 {
            let names: Vec<&str> = results
                .iter()
                .filter(|result| !result.passed)
                .map(|result| result.name.as_str())
                .collect();
            Err(GoldenError::TestFailed(format!(
                "{} fixture(s) failed: {}",
                failed,
                names.join(", ")
            )))
        } else {
            Ok(results)
        }
    }

    /// Compile, apply and compare one fixture
    pub fn run_fixture(&self, fixture: &Fixture) -> TestResult {
        let start = Instant::now();
        let (passed, error, diff) = if fixture.enabled {
            self.evaluate(fixture)
        } else {
            (true, None, None)
        };

        TestResult {
            name: fixture.id(),
            passed,
            error,
            diff,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn evaluate(&self, fixture: &Fixture) -> (bool, Option<String>, Option<String>) {
        let compiled = compile_fixture(fixture);

        match (&fixture.error, compiled) {
            (Some(pattern), Err(message)) if message.contains(pattern.as_str()) => (true, None, None),
            (Some(pattern), Err(message)) => (
                false,
                Some(format!("expected an error containing '{}', got: {}", pattern, message)),
                None,
            ),
            (Some(pattern), Ok(_)) => (
                false,
                Some(format!("expected an error containing '{}', but the spec compiled", pattern)),
                None,
            ),
            (None, Err(message)) => (false, Some(message), None),
            (None, Ok(chain)) => {
                let actual = chain.transform(&fixture.input);
                let engine = DiffEngine::new(DiffOptions {
                    unordered_lists: fixture.tags.iter().any(|tag| tag == "unordered"),
                    ..self.config.diff_options.clone()
                });
                let diff = engine.compare(&fixture.expected, &actual);
                if diff.matches {
                    (true, None, None)
                } else {
                    (
                        false,
                        Some(format!("output differs at: {}", diff.differing_paths.join(", "))),
                        Some(diff.diff_output),
                    )
                }
            }
        }
    }

    /// Ids of every fixture in the corpus
    pub fn list_tests(&self) -> Result<Vec<String>> {
        Ok(self.corpus_manager.discover()?.iter().map(Fixture::id).collect())
    }
}

/// A fixture's operation as a chain; single operations become one-entry chains
fn compile_fixture(fixture: &Fixture) -> std::result::Result<Chain, String> {
    let spec = if fixture.operation == "chain" {
        fixture.spec.clone()
    } else {
        json!([{ "operation": fixture.operation, "spec": fixture.spec }])
    };
    Chain::new(&spec).map_err(|e| match e {
        treeshift_core::Error::ChainStep { source, .. } => source.to_string(),
        other => other.to_string(),
    })
}

/// Run a fixture given as a JSON value, without touching the filesystem
pub fn check_inline(fixture: Value) -> Result<TestResult> {
    let fixture: Fixture = serde_json::from_value(fixture)?;
    let runner = GoldenTestRunner::new(GoldenConfig::default());
    Ok(runner.run_fixture(&fixture))
}
