//! Decision resolution: match a selected option to its outcome.

use crate::content::model::{DecisionOption, Outcome, Scenario};
use crate::core::error::{Result, ShieldError};

/// Find the outcome whose correctness matches the selected option
///
/// If several outcomes share the correctness value (an authoring error
/// the registry rejects at load), the first in authored order wins as a
/// defensive fallback. If none matches, resolution fails with
/// `ContentMismatch`; an outcome is never fabricated.
pub fn resolve<'a>(scenario: &'a Scenario, option: &DecisionOption) -> Result<&'a Outcome> {
    scenario
        .outcomes
        .iter()
        .find(|outcome| outcome.is_correct == option.is_correct)
        .ok_or_else(|| ShieldError::ContentMismatch {
            scenario: scenario.id,
            option: option.id.clone(),
        })
}
