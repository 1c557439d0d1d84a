//! Fixture discovery for golden tests
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::{GoldenError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One golden fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// File stem; filled in on load when the file does not name itself
    #[serde(default)]
    pub name: String,

    /// Directory below the corpus root; filled in on load
    #[serde(default)]
    pub category: String,

    /// What this fixture checks
    #[serde(default)]
    pub description: String,

    /// Operation name as accepted in chain entries, or `chain`
    pub operation: String,

    /// The spec to compile
    pub spec: Value,

    /// The document to transform
    #[serde(default)]
    pub input: Value,

    /// The document the transform must produce
    #[serde(default)]
    pub expected: Value,

    /// When set, compilation must fail with a message containing this text
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Fixture {
    /// `category/name`, or just the name at the corpus root
    pub fn id(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.category, self.name)
        }
    }
}

/// Manages the fixture corpus
pub struct CorpusManager {
    corpus_dir: PathBuf,
}

impl CorpusManager {
    pub fn new(corpus_dir: impl AsRef<Path>) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
        }
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Every `*.json` file below the corpus root, sorted by id
    pub fn discover(&self) -> Result<Vec<Fixture>> {
        let mut fixtures = Vec::new();

        if !self.corpus_dir.exists() {
            return Ok(fixtures);
        }

        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                fixtures.push(self.load(path)?);
            }
        }

        fixtures.sort_by_key(Fixture::id);
        Ok(fixtures)
    }

    /// Load one fixture file
    pub fn load(&self, path: &Path) -> Result<Fixture> {
        let content = fs::read_to_string(path)?;
        let mut fixture: Fixture = serde_json::from_str(&content)
            .map_err(|e| GoldenError::CorpusError(format!("{}: {}", path.display(), e)))?;

        if fixture.name.is_empty() {
            fixture.name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
        }
        if fixture.category.is_empty() {
            fixture.category = path
                .parent()
                .and_then(|parent| parent.strip_prefix(&self.corpus_dir).ok())
                .map(|relative| relative.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
        }
        Ok(fixture)
    }

    /// Load a fixture by id, e.g. `shift/identity`
    pub fn load_by_id(&self, id: &str) -> Result<Fixture> {
        self.load(&self.corpus_dir.join(format!("{}.json", id)))
    }

    /// Fixtures whose id contains `pattern`; `*` selects everything
    pub fn filter(&self, fixtures: Vec<Fixture>, pattern: &str) -> Vec<Fixture> {
        fixtures
            .into_iter()
            .filter(|fixture| pattern == "*" || fixture.id().contains(pattern))
            .collect()
    }

    /// Fixtures carrying any of `tags`; all fixtures when `tags` is empty
    pub fn filter_by_tags(&self, fixtures: Vec<Fixture>, tags: &[String]) -> Vec<Fixture> {
        if tags.is_empty() {
            return fixtures;
        }
        fixtures
            .into_iter()
            .filter(|fixture| tags.iter().any(|tag| fixture.tags.contains(tag)))
            .collect()
    }

    /// Fixture counts per category and operation
    pub fn statistics(&self) -> Result<CorpusStatistics> {
        let fixtures = self.discover()?;
        let mut stats = CorpusStatistics {
            total: fixtures.len(),
            ..Default::default()
        };

        for fixture in fixtures {
            if fixture.enabled {
                stats.enabled += 1;
            }
            *stats.by_category.entry(fixture.category).or_insert(0) += 1;
            *stats.by_operation.entry(fixture.operation).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

/// Statistics about the corpus
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub total: usize,
    pub enabled: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_operation: BTreeMap<String, usize>,
}

impl CorpusStatistics {
    /// Print statistics to stdout
    pub fn print(&self) {
        println!("=== Corpus Statistics ===");
        println!("Total fixtures: {}", self.total);
        println!("Enabled: {}", self.enabled);

        println!("\nFixtures by category:");
        for (category, count) in &self.by_category {
            println!("  {}: {}", category, count);
        }

        println!("\nFixtures by operation:");
        for (operation, count) in &self.by_operation {
            println!("  {}: {}", operation, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_fixture(root: &Path, relative: &str, fixture: Value) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&fixture).unwrap()).unwrap();
    }

    #[test]
    fn test_discover_fills_name_and_category() {
        let temp_dir = TempDir::new().unwrap();
        write_fixture(
            temp_dir.path(),
            "shift/identity.json",
            json!({"operation": "shift", "spec": {"*": "&"}, "input": {"a": 1}, "expected": {"a": 1}}),
        );
        write_fixture(
            temp_dir.path(),
            "top.json",
            json!({"name": "named", "operation": "remove", "spec": {"a": ""}}),
        );

        let manager = CorpusManager::new(temp_dir.path());
        let fixtures = manager.discover().unwrap();
        let ids: Vec<_> = fixtures.iter().map(Fixture::id).collect();
        assert_eq!(ids, vec!["named", "shift/identity"]);
        assert!(fixtures.iter().all(|fixture| fixture.enabled));
    }

    #[test]
    fn test_malformed_fixture_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.json"), "{\"spec\": {}}").unwrap();

        let err = CorpusManager::new(temp_dir.path()).discover().unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_filter_and_statistics() {
        let temp_dir = TempDir::new().unwrap();
        for (relative, operation) in [("a/one.json", "shift"), ("a/two.json", "remove"), ("b/three.json", "shift")] {
            write_fixture(temp_dir.path(), relative, json!({"operation": operation, "spec": {"x": "y"}}));
        }

        let manager = CorpusManager::new(temp_dir.path());
        let fixtures = manager.discover().unwrap();
        assert_eq!(manager.filter(fixtures.clone(), "a/").len(), 2);
        assert_eq!(manager.filter(fixtures, "*").len(), 3);

        let stats = manager.statistics().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_operation["shift"], 2);
        assert_eq!(stats.by_category["b"], 1);
    }

    #[test]
    fn test_missing_corpus_is_empty() {
        let manager = CorpusManager::new("/definitely/not/here");
        assert!(manager.discover().unwrap().is_empty());
    }
}
