//! Content registry for loading and validating scenarios.
//!
//! This module provides the `ContentRegistry` which holds all authored
//! scenarios and categories, handles TOML file loading, and enforces
//! content invariants at load time so that playback never has to cope
//! with malformed scenarios.

use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::content::model::{Category, Scenario};
use crate::core::types::{CategoryId, ScenarioId};

/// Decision options a scenario may declare
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;

/// Error type for content loading and validation
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Duplicate scenario id: {0}")]
    DuplicateScenario(ScenarioId),

    #[error("Validation errors: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// Wrapper for the categories TOML file (`[[categories]]` tables)
#[derive(Debug, Deserialize)]
struct CategoryFile {
    categories: Vec<Category>,
}

/// Read-only registry of all authored scenarios and categories
///
/// Scenarios keep their load order; messages, options, and outcomes keep
/// their authored order and are never deduplicated.
pub struct ContentRegistry {
    scenarios: Vec<Scenario>,
    by_id: AHashMap<ScenarioId, usize>,
    by_category: AHashMap<CategoryId, Vec<usize>>,
    categories: Vec<Category>,
}

impl ContentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            scenarios: Vec::new(),
            by_id: AHashMap::new(),
            by_category: AHashMap::new(),
            categories: Vec::new(),
        }
    }

    /// Register a scenario after validating it
    pub fn register(&mut self, scenario: Scenario) -> Result<ScenarioId, ContentError> {
        if self.by_id.contains_key(&scenario.id) {
            return Err(ContentError::DuplicateScenario(scenario.id));
        }

        let errors = validate_scenario(&scenario);
        if !errors.is_empty() {
            return Err(ContentError::Validation(errors));
        }

        let id = scenario.id;
        let idx = self.scenarios.len();
        self.by_id.insert(id, idx);
        self.by_category
            .entry(scenario.category_id)
            .or_default()
            .push(idx);
        self.scenarios.push(scenario);

        Ok(id)
    }

    /// Register without validation, for exercising defective-content
    /// handling in tests
    #[cfg(test)]
    pub(crate) fn register_unvalidated(&mut self, scenario: Scenario) -> ScenarioId {
        let id = scenario.id;
        let idx = self.scenarios.len();
        self.by_id.insert(id, idx);
        self.by_category
            .entry(scenario.category_id)
            .or_default()
            .push(idx);
        self.scenarios.push(scenario);
        id
    }

    /// Load a single scenario from a TOML file
    pub fn load_file(&mut self, path: &Path) -> Result<ScenarioId, ContentError> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = toml::from_str(&content).map_err(|e| ContentError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.register(scenario)
    }

    /// Load all .toml scenario files from a directory recursively
    ///
    /// Files are visited in sorted path order so load order is stable
    /// across platforms.
    pub fn load_directory(&mut self, path: &Path) -> Result<Vec<ScenarioId>, ContentError> {
        let mut ids = Vec::new();
        self.load_directory_recursive(path, &mut ids)?;
        Ok(ids)
    }

    fn load_directory_recursive(
        &mut self,
        path: &Path,
        ids: &mut Vec<ScenarioId>,
    ) -> Result<(), ContentError> {
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        for entry_path in entries {
            if entry_path.is_dir() {
                self.load_directory_recursive(&entry_path, ids)?;
            } else if entry_path.extension().is_some_and(|ext| ext == "toml") {
                let id = self.load_file(&entry_path)?;
                ids.push(id);
            }
        }
        Ok(())
    }

    /// Load category definitions from a TOML file
    pub fn load_categories(&mut self, path: &Path) -> Result<(), ContentError> {
        let content = std::fs::read_to_string(path)?;
        let file: CategoryFile = toml::from_str(&content).map_err(|e| ContentError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.categories = file.categories;
        Ok(())
    }

    /// All scenarios in load order
    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Get a scenario by id
    pub fn get(&self, id: ScenarioId) -> Option<&Scenario> {
        self.by_id.get(&id).map(|&idx| &self.scenarios[idx])
    }

    /// All scenarios in a category, in load order
    pub fn by_category(&self, category: CategoryId) -> Vec<&Scenario> {
        self.by_category
            .get(&category)
            .map(|indexes| indexes.iter().map(|&idx| &self.scenarios[idx]).collect())
            .unwrap_or_default()
    }

    /// All category definitions
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Get a category by id
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a scenario against the content invariants
///
/// Playback assumes these hold, so violations are authoring defects that
/// must be caught here rather than at runtime during an attempt.
pub fn validate_scenario(scenario: &Scenario) -> Vec<String> {
    let mut errors = Vec::new();
    let label = format!("scenario {}", scenario.id);

    if scenario.messages.is_empty() {
        errors.push(format!("{label}: message sequence is empty"));
    } else if scenario.final_message().is_none() {
        errors.push(format!("{label}: no renderable (non-system) messages"));
    }

    let option_count = scenario.options.len();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&option_count) {
        errors.push(format!(
            "{label}: has {option_count} options, expected {MIN_OPTIONS} to {MAX_OPTIONS}"
        ));
    }

    if scenario.outcomes.is_empty() {
        errors.push(format!("{label}: has no outcomes"));
    }

    // Every correctness value offered by an option must resolve to an
    // outcome. Scenarios whose options are all safe need only the safe
    // outcome (the two legitimate-message scenarios are authored that way).
    for wanted in [true, false] {
        let offered = scenario.options.iter().any(|o| o.is_correct == wanted);
        let covered = scenario.outcomes.iter().any(|o| o.is_correct == wanted);
        if offered && !covered {
            errors.push(format!(
                "{label}: option with is_correct={wanted} has no matching outcome"
            ));
        }
    }

    // Two outcomes with the same correctness would make resolution
    // ambiguous; the runtime first-match rule exists only as a fallback.
    for wanted in [true, false] {
        let count = scenario
            .outcomes
            .iter()
            .filter(|o| o.is_correct == wanted)
            .count();
        if count > 1 {
            errors.push(format!(
                "{label}: {count} outcomes share is_correct={wanted}"
            ));
        }
    }

    for (collection, name) in [
        (
            scenario.options.iter().map(|o| o.id.0.as_str()).collect::<Vec<_>>(),
            "option",
        ),
        (
            scenario.outcomes.iter().map(|o| o.id.0.as_str()).collect::<Vec<_>>(),
            "outcome",
        ),
    ] {
        let mut seen = std::collections::HashSet::new();
        for id in collection {
            if !seen.insert(id) {
                errors.push(format!("{label}: duplicate {name} id '{id}'"));
            }
        }
    }

    errors
}
