//! The durable per-device progress record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::types::ScenarioId;

/// Completed scenarios and cumulative score for one device
///
/// The score only ever increases, only by the fixed per-scenario award,
/// and only once per distinct scenario id. The wire shape matches the
/// record the app has always persisted: `{"completed": [...],
/// "userScore": n}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    completed: HashSet<ScenarioId>,
    #[serde(default, rename = "userScore")]
    score: u32,
}

impl ProgressRecord {
    /// Create an empty record (no completions, zero score)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, id: ScenarioId) -> bool {
        self.completed.contains(&id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Mark a scenario completed, awarding `award` points when the
    /// first completion was correct
    ///
    /// Idempotent per scenario id: if the id is already in the completed
    /// set nothing changes, regardless of `was_correct`. Returns whether
    /// the record was modified.
    pub fn record_completion(&mut self, id: ScenarioId, was_correct: bool, award: u32) -> bool {
        if !self.completed.insert(id) {
            return false;
        }
        if was_correct {
            self.score += award;
        }
        true
    }

    /// Share of `total` scenarios completed, rounded to whole percent
    ///
    /// Defined as 0 when `total` is 0.
    pub fn percentage(&self, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let ratio = self.completed.len() as f64 / total as f64;
        (ratio * 100.0).round() as u8
    }

    /// Clear completions and score back to the initial empty state
    pub fn reset(&mut self) {
        self.completed.clear();
        self.score = 0;
    }
}

/// Snapshot of progress for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: u8,
    pub score: u32,
}
