//! Durable storage for the progress record.
//!
//! `ProgressStore` holds the in-memory record and pushes every mutation
//! through an injected persistence backend before returning, so a crash
//! right after a successful call never loses the update. Load failures
//! degrade to an empty record; save failures are surfaced to the caller
//! but never roll back the in-memory state.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::error::{Result, ShieldError};
use crate::core::types::ScenarioId;
use crate::progress::record::{ProgressRecord, ProgressSummary};

/// Backend that can load and save the progress record
pub trait Persistence {
    /// Load the last saved record; `Ok(None)` when nothing usable is
    /// stored (missing or malformed data is absent, not fatal)
    fn load(&self) -> Result<Option<ProgressRecord>>;

    /// Durably save the record
    fn save(&self, record: &ProgressRecord) -> Result<()>;
}

/// JSON-file persistence, one record per file
///
/// Writes go to a sibling temp file first and are renamed into place, so
/// a reader never observes a partial record.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Option<ProgressRecord>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "malformed progress record, starting fresh"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, record: &ProgressRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory persistence for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<ProgressRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Option<ProgressRecord>> {
        Ok(self.record.lock().unwrap().clone())
    }

    fn save(&self, record: &ProgressRecord) -> Result<()> {
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }
}

/// The progress service: in-memory record plus durable backend
pub struct ProgressStore {
    record: ProgressRecord,
    backend: Box<dyn Persistence>,
    completion_award: u32,
}

impl ProgressStore {
    /// Open the store, restoring the last persisted record
    ///
    /// A backend load error is logged and degrades to the empty record;
    /// it never prevents startup.
    pub fn open(backend: Box<dyn Persistence>, completion_award: u32) -> Self {
        let record = match backend.load() {
            Ok(Some(record)) => record,
            Ok(None) => ProgressRecord::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load progress, starting fresh");
                ProgressRecord::new()
            }
        };

        Self {
            record,
            backend,
            completion_award,
        }
    }

    pub fn is_completed(&self, id: ScenarioId) -> bool {
        self.record.is_completed(id)
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub fn score(&self) -> u32 {
        self.record.score()
    }

    /// Mark a scenario completed and persist the result
    ///
    /// Idempotent per scenario id (see [`ProgressRecord::record_completion`]).
    /// Returns whether the record changed. On a save failure the error is
    /// returned so the shell can warn that progress may not be retained,
    /// but the in-memory update stands.
    pub fn record_completion(&mut self, id: ScenarioId, was_correct: bool) -> Result<bool> {
        let changed = self
            .record
            .record_completion(id, was_correct, self.completion_award);

        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    /// Clear all progress and persist the empty record
    pub fn reset(&mut self) -> Result<()> {
        self.record.reset();
        self.persist()
    }

    pub fn percentage(&self, total: usize) -> u8 {
        self.record.percentage(total)
    }

    pub fn summary(&self, total: usize) -> ProgressSummary {
        ProgressSummary {
            completed_count: self.record.completed_count(),
            total_count: total,
            percentage: self.record.percentage(total),
            score: self.record.score(),
        }
    }

    fn persist(&self) -> Result<()> {
        self.backend.save(&self.record).map_err(|e| {
            tracing::warn!(error = %e, "failed to persist progress");
            ShieldError::Persistence(e.to_string())
        })
    }
}
