use thiserror::Error;

use crate::core::types::{OptionId, ScenarioId};

#[derive(Error, Debug)]
pub enum ShieldError {
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),

    #[error("No outcome matches option '{option}' in scenario {scenario}")]
    ContentMismatch {
        scenario: ScenarioId,
        option: OptionId,
    },

    #[error("Option '{option}' does not exist in scenario {scenario}")]
    UnknownOption {
        scenario: ScenarioId,
        option: OptionId,
    },

    #[error("Invalid session transition: {event} not allowed in {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Progress persistence failed: {0}")]
    Persistence(String),

    #[error("Content error: {0}")]
    Content(#[from] crate::content::ContentError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShieldError>;
