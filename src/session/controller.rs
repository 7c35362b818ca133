//! Session controller: orchestrates one scenario attempt.
//!
//! Drives the reveal machine while the conversation is on screen, hands
//! the chosen option to the resolution engine, applies the progress
//! update, and gates the retry/exit affordances. All attempt-scoped
//! state lives here and is discarded on exit; the progress record is the
//! only state that outlives an attempt.

use crate::content::model::{DecisionOption, Outcome, Scenario};
use crate::content::registry::ContentRegistry;
use crate::core::config::EngineConfig;
use crate::core::error::{Result, ShieldError};
use crate::core::types::{AttemptId, OptionId, ScenarioId};
use crate::progress::record::ProgressSummary;
use crate::progress::store::ProgressStore;
use crate::session::resolve::resolve;
use crate::session::reveal::{DwellTimer, RevealMachine};

/// Where one attempt currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No attempt in progress
    Idle,
    /// Conversation on screen, options not yet unlocked
    Viewing,
    /// End of transcript reached; waiting for the player's choice
    OptionsShown,
    /// An outcome is on screen; retry or exit comes next
    OutcomeShown,
}

impl AttemptPhase {
    fn name(self) -> &'static str {
        match self {
            AttemptPhase::Idle => "Idle",
            AttemptPhase::Viewing => "Viewing",
            AttemptPhase::OptionsShown => "OptionsShown",
            AttemptPhase::OutcomeShown => "OutcomeShown",
        }
    }
}

/// Attempt-scoped state, discarded when the player exits
struct Attempt {
    id: AttemptId,
    scenario_id: ScenarioId,
    phase: AttemptPhase,
    reveal: RevealMachine,
    selected: Option<OptionId>,
    /// Index into the scenario's outcome list once resolved
    outcome_idx: Option<usize>,
    /// Set when the completion could not be persisted
    save_warning: bool,
}

/// Orchestrates scenario attempts against the content registry and the
/// progress store
pub struct SessionController<'c> {
    content: &'c ContentRegistry,
    progress: ProgressStore,
    config: EngineConfig,
    attempt: Option<Attempt>,
}

impl<'c> SessionController<'c> {
    pub fn new(content: &'c ContentRegistry, progress: ProgressStore, config: EngineConfig) -> Self {
        Self {
            content,
            progress,
            config,
            attempt: None,
        }
    }

    /// Begin an attempt at the given scenario
    ///
    /// Refuses unknown ids. Re-selecting while an attempt is in progress
    /// starts over from the top of the transcript.
    pub fn start_attempt(&mut self, scenario_id: ScenarioId) -> Result<()> {
        if self.content.get(scenario_id).is_none() {
            return Err(ShieldError::ScenarioNotFound(scenario_id));
        }

        let mut reveal = RevealMachine::new(&self.config);
        reveal.begin();

        let attempt = Attempt {
            id: AttemptId::new(),
            scenario_id,
            phase: AttemptPhase::Viewing,
            reveal,
            selected: None,
            outcome_idx: None,
            save_warning: false,
        };
        tracing::debug!(scenario = %scenario_id, attempt = ?attempt.id, "attempt started");
        self.attempt = Some(attempt);
        Ok(())
    }

    pub fn phase(&self) -> AttemptPhase {
        self.attempt
            .as_ref()
            .map_or(AttemptPhase::Idle, |a| a.phase)
    }

    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt.as_ref().map(|a| a.id)
    }

    /// The scenario under attempt, for rendering
    pub fn scenario(&self) -> Option<&'c Scenario> {
        let attempt = self.attempt.as_ref()?;
        self.content.get(attempt.scenario_id)
    }

    /// Whether the manual scroll-to-end affordance should be shown
    pub fn scroll_hint_visible(&self) -> bool {
        self.attempt
            .as_ref()
            .is_some_and(|a| a.phase == AttemptPhase::Viewing && a.reveal.scroll_hint_visible())
    }

    /// Report the visible fraction of the final transcript message
    ///
    /// Returns a dwell timer for the caller to schedule when the
    /// threshold is crossed. Ignored outside the `Viewing` phase (the
    /// unlock is one-way; scrolling afterwards changes nothing).
    pub fn visibility_changed(&mut self, ratio: f32) -> Result<Option<DwellTimer>> {
        let attempt = self.active_attempt("visibility_changed")?;
        if attempt.phase != AttemptPhase::Viewing {
            return Ok(None);
        }
        Ok(attempt.reveal.visibility_changed(ratio))
    }

    /// A previously issued dwell timer elapsed
    ///
    /// Returns whether the options just unlocked. Stale tokens are
    /// ignored.
    pub fn timer_elapsed(&mut self, token: u64) -> Result<bool> {
        let attempt = self.active_attempt("timer_elapsed")?;
        if attempt.phase != AttemptPhase::Viewing {
            return Ok(false);
        }

        let unlocked = attempt.reveal.timer_elapsed(token);
        if unlocked {
            attempt.phase = AttemptPhase::OptionsShown;
            tracing::debug!(attempt = ?attempt.id, "options unlocked");
        }
        Ok(unlocked)
    }

    /// Jump the view to the end of the transcript
    ///
    /// Does not satisfy the dwell requirement by itself; the returned
    /// timer still has to run its full course.
    pub fn jump_to_end(&mut self) -> Result<Option<DwellTimer>> {
        let attempt = self.active_attempt("jump_to_end")?;
        if attempt.phase != AttemptPhase::Viewing {
            return Ok(None);
        }
        Ok(attempt.reveal.jump_to_end())
    }

    /// Options available for selection (empty outside `OptionsShown`)
    pub fn available_options(&self) -> &'c [DecisionOption] {
        match (self.phase(), self.scenario()) {
            (AttemptPhase::OptionsShown, Some(scenario)) => &scenario.options,
            _ => &[],
        }
    }

    /// Resolve the player's choice and show its outcome
    ///
    /// Applies the progress update exactly once per selection; the
    /// progress store's idempotence rule decides whether anything is
    /// awarded. A persistence failure is remembered (see
    /// [`Self::save_warning`]) but does not block the attempt. On
    /// `ContentMismatch` the attempt stays in `OptionsShown`.
    pub fn select_option(&mut self, option_id: &OptionId) -> Result<&'c Outcome> {
        let content = self.content;
        let attempt = match self.attempt.as_mut() {
            Some(a) => a,
            None => {
                return Err(ShieldError::InvalidTransition {
                    state: "Idle",
                    event: "select_option",
                })
            }
        };
        if attempt.phase != AttemptPhase::OptionsShown {
            return Err(ShieldError::InvalidTransition {
                state: attempt.phase.name(),
                event: "select_option",
            });
        }

        let scenario = content
            .get(attempt.scenario_id)
            .ok_or(ShieldError::ScenarioNotFound(attempt.scenario_id))?;
        let option = scenario
            .option(option_id)
            .ok_or_else(|| ShieldError::UnknownOption {
                scenario: scenario.id,
                option: option_id.clone(),
            })?;

        let outcome = resolve(scenario, option)?;
        let outcome_idx = scenario
            .outcomes
            .iter()
            .position(|o| o.id == outcome.id)
            .unwrap_or(0);

        // First completion is authoritative; repeats are no-ops inside
        // the store.
        if let Err(e) = self
            .progress
            .record_completion(scenario.id, outcome.is_correct)
        {
            tracing::warn!(scenario = %scenario.id, error = %e, "progress may not be retained");
            attempt.save_warning = true;
        }

        attempt.selected = Some(option_id.clone());
        attempt.outcome_idx = Some(outcome_idx);
        attempt.phase = AttemptPhase::OutcomeShown;
        Ok(outcome)
    }

    /// The option the player picked, until retry or exit clears it
    pub fn selected_option(&self) -> Option<&OptionId> {
        self.attempt.as_ref()?.selected.as_ref()
    }

    /// The outcome currently on screen, if any
    pub fn shown_outcome(&self) -> Option<&'c Outcome> {
        let attempt = self.attempt.as_ref()?;
        let idx = attempt.outcome_idx?;
        self.scenario()?.outcomes.get(idx)
    }

    /// Whether the try-again affordance applies (only after an unsafe
    /// outcome)
    pub fn can_retry(&self) -> bool {
        self.phase() == AttemptPhase::OutcomeShown
            && self.shown_outcome().is_some_and(|o| !o.is_correct)
    }

    /// Return to the options with the selection cleared
    ///
    /// Only permitted while an incorrect outcome is shown; the
    /// transcript state is untouched.
    pub fn retry(&mut self) -> Result<()> {
        if !self.can_retry() {
            return Err(ShieldError::InvalidTransition {
                state: self.phase().name(),
                event: "retry",
            });
        }

        if let Some(attempt) = self.attempt.as_mut() {
            attempt.selected = None;
            attempt.outcome_idx = None;
            attempt.phase = AttemptPhase::OptionsShown;
            tracing::debug!(attempt = ?attempt.id, "retrying");
        }
        Ok(())
    }

    /// Leave the scenario, discarding all attempt-scoped state
    ///
    /// Permitted from any phase; re-entering the same scenario later
    /// starts from the top of the transcript.
    pub fn exit(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            tracing::debug!(attempt = ?attempt.id, "attempt exited");
        }
    }

    /// Whether the last completion failed to persist
    pub fn save_warning(&self) -> bool {
        self.attempt.as_ref().is_some_and(|a| a.save_warning)
    }

    pub fn progress_summary(&self) -> ProgressSummary {
        self.progress.summary(self.content.len())
    }

    pub fn is_completed(&self, id: ScenarioId) -> bool {
        self.progress.is_completed(id)
    }

    /// Explicit user-initiated progress reset
    pub fn reset_progress(&mut self) -> Result<()> {
        self.progress.reset()
    }

    fn active_attempt(&mut self, event: &'static str) -> Result<&mut Attempt> {
        self.attempt
            .as_mut()
            .ok_or(ShieldError::InvalidTransition {
                state: "Idle",
                event,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{IconTag, Message, Sender};
    use crate::core::types::{CategoryId, MessageId, OutcomeId};
    use crate::progress::store::MemoryStore;

    fn option(id: &str, text: &str, is_correct: bool) -> DecisionOption {
        DecisionOption {
            id: OptionId(id.to_string()),
            text: text.to_string(),
            is_correct,
        }
    }

    fn outcome(id: &str, title: &str, is_correct: bool) -> Outcome {
        Outcome {
            id: OutcomeId(id.to_string()),
            title: title.to_string(),
            description: "What happened".to_string(),
            is_correct,
            explanation: vec!["Point".to_string()],
            advice: "Advice".to_string(),
        }
    }

    fn lottery_scenario(id: u32) -> Scenario {
        Scenario {
            id: ScenarioId(id),
            title: "Lottery Scam".to_string(),
            description: "Too good to be true".to_string(),
            category_id: CategoryId(1),
            contact_name: "Subrat".to_string(),
            contact_status: "online".to_string(),
            icon: IconTag::Ticket,
            messages: vec![
                Message {
                    id: MessageId("msg1".to_string()),
                    sender: Sender::Contact,
                    content: "You won 5 lakh!".to_string(),
                    timestamp: Some("11:03 AM".to_string()),
                    attachment: None,
                },
                Message {
                    id: MessageId("msg2".to_string()),
                    sender: Sender::User,
                    content: "Really?".to_string(),
                    timestamp: Some("11:05 AM".to_string()),
                    attachment: None,
                },
            ],
            options: vec![
                option("opt1", "Let me check the link.", false),
                option("opt2", "This seems fishy.", true),
            ],
            outcomes: vec![
                outcome("out1", "Unsafe Choice!", false),
                outcome("out2", "Safe Choice!", true),
            ],
        }
    }

    fn registry() -> ContentRegistry {
        let mut registry = ContentRegistry::new();
        registry.register(lottery_scenario(1)).unwrap();
        registry.register(lottery_scenario(2)).unwrap();
        registry
    }

    fn controller(content: &ContentRegistry) -> SessionController<'_> {
        let progress = ProgressStore::open(Box::new(MemoryStore::new()), 20);
        SessionController::new(content, progress, EngineConfig::default())
    }

    /// Drive the reveal machine through a full dwell
    fn reveal_all(c: &mut SessionController<'_>) {
        let timer = c.visibility_changed(1.0).unwrap().expect("timer armed");
        assert!(c.timer_elapsed(timer.token).unwrap());
    }

    #[test]
    fn test_unknown_scenario_refused() {
        let content = registry();
        let mut c = controller(&content);

        let result = c.start_attempt(ScenarioId(42));
        assert!(matches!(result, Err(ShieldError::ScenarioNotFound(_))));
        assert_eq!(c.phase(), AttemptPhase::Idle);
    }

    #[test]
    fn test_options_hidden_until_dwell() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();

        assert_eq!(c.phase(), AttemptPhase::Viewing);
        assert!(c.available_options().is_empty());
        assert!(c.scroll_hint_visible());

        reveal_all(&mut c);
        assert_eq!(c.phase(), AttemptPhase::OptionsShown);
        assert_eq!(c.available_options().len(), 2);
        assert!(!c.scroll_hint_visible());
    }

    #[test]
    fn test_select_before_options_is_invalid() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();

        let result = c.select_option(&OptionId("opt2".to_string()));
        assert!(matches!(
            result,
            Err(ShieldError::InvalidTransition { state: "Viewing", .. })
        ));
    }

    #[test]
    fn test_correct_selection_awards_and_blocks_retry() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);

        let outcome = c.select_option(&OptionId("opt2".to_string())).unwrap();
        assert_eq!(outcome.title, "Safe Choice!");
        assert_eq!(c.phase(), AttemptPhase::OutcomeShown);
        assert!(!c.can_retry());
        assert!(matches!(c.retry(), Err(ShieldError::InvalidTransition { .. })));

        let summary = c.progress_summary();
        assert_eq!(summary.score, 20);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.percentage, 50);
    }

    #[test]
    fn test_incorrect_selection_allows_retry_with_cleared_choice() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);

        let outcome = c.select_option(&OptionId("opt1".to_string())).unwrap();
        assert_eq!(outcome.title, "Unsafe Choice!");
        assert!(c.can_retry());

        c.retry().unwrap();
        assert_eq!(c.phase(), AttemptPhase::OptionsShown);
        assert!(c.shown_outcome().is_none());
        assert!(c.selected_option().is_none());

        // Transcript state untouched: options are immediately selectable.
        let outcome = c.select_option(&OptionId("opt2".to_string())).unwrap();
        assert_eq!(outcome.title, "Safe Choice!");

        // First completion (incorrect) was authoritative; no points.
        assert_eq!(c.progress_summary().score, 0);
        assert_eq!(c.progress_summary().completed_count, 1);
    }

    #[test]
    fn test_unknown_option_id() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);

        let result = c.select_option(&OptionId("nope".to_string()));
        assert!(matches!(result, Err(ShieldError::UnknownOption { .. })));
        // Still selectable.
        assert_eq!(c.phase(), AttemptPhase::OptionsShown);
    }

    #[test]
    fn test_content_mismatch_does_not_advance() {
        // Bypass load-time validation to simulate a data defect: an
        // unsafe option with no unsafe outcome.
        let mut scenario = lottery_scenario(1);
        scenario.outcomes.retain(|o| o.is_correct);

        let mut registry = ContentRegistry::new();
        registry.register_unvalidated(scenario);

        let progress = ProgressStore::open(Box::new(MemoryStore::new()), 20);
        let mut c = SessionController::new(&registry, progress, EngineConfig::default());
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);

        let result = c.select_option(&OptionId("opt1".to_string()));
        assert!(matches!(result, Err(ShieldError::ContentMismatch { .. })));

        // The session stays put and records nothing.
        assert_eq!(c.phase(), AttemptPhase::OptionsShown);
        assert!(c.shown_outcome().is_none());
        assert_eq!(c.progress_summary().completed_count, 0);

        // The safe option still resolves normally.
        assert!(c.select_option(&OptionId("opt2".to_string())).is_ok());
    }

    #[test]
    fn test_exit_discards_attempt_state() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);
        c.select_option(&OptionId("opt2".to_string())).unwrap();

        c.exit();
        assert_eq!(c.phase(), AttemptPhase::Idle);
        assert!(c.shown_outcome().is_none());

        // Re-entering restarts from the top: options locked again.
        c.start_attempt(ScenarioId(1)).unwrap();
        assert_eq!(c.phase(), AttemptPhase::Viewing);
        assert!(c.available_options().is_empty());

        // Progress survives the exit.
        assert_eq!(c.progress_summary().score, 20);
    }

    #[test]
    fn test_reselection_restarts_attempt() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);
        let first_id = c.attempt_id().unwrap();

        c.start_attempt(ScenarioId(1)).unwrap();
        assert_ne!(c.attempt_id().unwrap(), first_id);
        assert_eq!(c.phase(), AttemptPhase::Viewing);
    }

    #[test]
    fn test_event_with_no_attempt_is_invalid() {
        let content = registry();
        let mut c = controller(&content);

        assert!(matches!(
            c.visibility_changed(1.0),
            Err(ShieldError::InvalidTransition { state: "Idle", .. })
        ));
        assert!(matches!(
            c.timer_elapsed(1),
            Err(ShieldError::InvalidTransition { state: "Idle", .. })
        ));
    }

    #[test]
    fn test_scrolling_after_unlock_is_ignored() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);

        assert_eq!(c.visibility_changed(0.0).unwrap(), None);
        assert_eq!(c.phase(), AttemptPhase::OptionsShown);
    }

    #[test]
    fn test_reset_progress() {
        let content = registry();
        let mut c = controller(&content);
        c.start_attempt(ScenarioId(1)).unwrap();
        reveal_all(&mut c);
        c.select_option(&OptionId("opt2".to_string())).unwrap();
        c.exit();

        c.reset_progress().unwrap();
        let summary = c.progress_summary();
        assert_eq!(summary.completed_count, 0);
        assert_eq!(summary.score, 0);
    }
}
