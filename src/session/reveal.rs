//! Transcript reveal state machine.
//!
//! Governs when the decision options unlock: the final message of the
//! conversation must stay continuously visible for a minimum dwell time
//! before the machine leaves `Revealing`. The machine consumes abstract
//! visibility samples and timer-elapse events; scheduling the timer is
//! the caller's job, so the logic is deterministic and testable without
//! a clock.

use crate::core::config::EngineConfig;

/// Reveal stage of one scenario attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Transcript reset to the start, nothing observed yet
    Initializing,
    /// Conversation on screen, end not yet dwelled on
    Revealing,
    /// Final message was held in view long enough; options stay
    /// unlocked for the rest of the attempt
    AwaitingOptionTap,
}

/// A dwell timer the caller must schedule
///
/// When `duration_ms` elapses, feed the token back via
/// [`RevealMachine::timer_elapsed`]. The machine may invalidate the
/// token before then; a stale token firing is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellTimer {
    pub token: u64,
    pub duration_ms: u64,
}

/// State machine driving the transcript reveal of one attempt
#[derive(Debug)]
pub struct RevealMachine {
    state: RevealState,
    visibility_threshold: f32,
    dwell_duration_ms: u64,
    /// Token of the currently armed dwell timer, if any
    armed: Option<u64>,
    next_token: u64,
}

impl RevealMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: RevealState::Initializing,
            visibility_threshold: config.visibility_threshold,
            dwell_duration_ms: config.dwell_duration_ms,
            armed: None,
            next_token: 1,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    /// Whether the end of the transcript has been reached
    pub fn reached_end(&self) -> bool {
        self.state == RevealState::AwaitingOptionTap
    }

    /// Whether the manual scroll-to-end affordance should be shown
    pub fn scroll_hint_visible(&self) -> bool {
        !self.reached_end()
    }

    /// The transcript has been rendered; start revealing
    pub fn begin(&mut self) {
        match self.state {
            RevealState::Initializing => self.state = RevealState::Revealing,
            _ => tracing::debug!(state = ?self.state, "begin ignored, reveal already started"),
        }
    }

    /// Report the visible fraction of the final message
    ///
    /// Crossing the threshold arms a dwell timer and returns it for the
    /// caller to schedule. Dropping below the threshold invalidates any
    /// pending timer: partial dwell never carries over. Samples are
    /// ignored before `begin` and after the end has been reached.
    pub fn visibility_changed(&mut self, ratio: f32) -> Option<DwellTimer> {
        if self.state != RevealState::Revealing {
            return None;
        }

        if ratio >= self.visibility_threshold {
            if self.armed.is_some() {
                // Still visible, timer already running; do not extend it.
                return None;
            }
            let token = self.next_token;
            self.next_token += 1;
            self.armed = Some(token);
            Some(DwellTimer {
                token,
                duration_ms: self.dwell_duration_ms,
            })
        } else {
            if self.armed.take().is_some() {
                tracing::debug!(ratio, "dwell interrupted, timer invalidated");
            }
            None
        }
    }

    /// A previously issued dwell timer elapsed
    ///
    /// Transitions to `AwaitingOptionTap` only if the token is still the
    /// armed one; stale tokens (invalidated by a visibility drop) are
    /// ignored. Returns whether the transition happened.
    pub fn timer_elapsed(&mut self, token: u64) -> bool {
        if self.state != RevealState::Revealing || self.armed != Some(token) {
            return false;
        }
        self.armed = None;
        self.state = RevealState::AwaitingOptionTap;
        true
    }

    /// Jump the view to the end of the transcript
    ///
    /// The jump itself never satisfies the dwell requirement; it only
    /// brings the final message fully into view, which arms a fresh
    /// timer like any other visibility sample.
    pub fn jump_to_end(&mut self) -> Option<DwellTimer> {
        self.visibility_changed(1.0)
    }

    /// Reset to the start of the transcript (scenario re-selection)
    pub fn reset(&mut self) {
        self.state = RevealState::Initializing;
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> RevealMachine {
        let mut m = RevealMachine::new(&EngineConfig::default());
        m.begin();
        m
    }

    #[test]
    fn test_initializing_until_begin() {
        let m = RevealMachine::new(&EngineConfig::default());
        assert_eq!(m.state(), RevealState::Initializing);

        let mut m = RevealMachine::new(&EngineConfig::default());
        // Samples before begin are ignored.
        assert!(m.visibility_changed(1.0).is_none());
        m.begin();
        assert_eq!(m.state(), RevealState::Revealing);
    }

    #[test]
    fn test_uninterrupted_dwell_unlocks_options() {
        let mut m = machine();

        let timer = m.visibility_changed(0.9).expect("threshold crossed");
        assert_eq!(timer.duration_ms, 1000);

        assert!(m.timer_elapsed(timer.token));
        assert_eq!(m.state(), RevealState::AwaitingOptionTap);
        assert!(m.reached_end());
        assert!(!m.scroll_hint_visible());
    }

    #[test]
    fn test_partial_dwell_does_not_carry_over() {
        let mut m = machine();

        // Final message visible; timer armed.
        let first = m.visibility_changed(0.85).unwrap();

        // Visibility lost at 0.9s of the required 1.0s.
        assert!(m.visibility_changed(0.5).is_none());

        // The old timer fires anyway (it was already scheduled) and must
        // be ignored.
        assert!(!m.timer_elapsed(first.token));
        assert_eq!(m.state(), RevealState::Revealing);

        // Regaining visibility arms a fresh timer; only its full,
        // uninterrupted dwell triggers the transition.
        let second = m.visibility_changed(0.95).unwrap();
        assert_ne!(second.token, first.token);
        assert!(m.timer_elapsed(second.token));
        assert_eq!(m.state(), RevealState::AwaitingOptionTap);
    }

    #[test]
    fn test_continuous_visibility_keeps_one_timer() {
        let mut m = machine();

        let timer = m.visibility_changed(0.9).unwrap();
        // Jitter above the threshold must not restart the dwell.
        assert!(m.visibility_changed(0.83).is_none());
        assert!(m.visibility_changed(1.0).is_none());

        assert!(m.timer_elapsed(timer.token));
    }

    #[test]
    fn test_below_threshold_never_arms() {
        let mut m = machine();
        assert!(m.visibility_changed(0.79).is_none());
        assert!(m.visibility_changed(0.0).is_none());
        assert_eq!(m.state(), RevealState::Revealing);
    }

    #[test]
    fn test_transition_is_one_way() {
        let mut m = machine();
        let timer = m.visibility_changed(1.0).unwrap();
        assert!(m.timer_elapsed(timer.token));

        // Scrolling away after the options unlocked changes nothing.
        assert!(m.visibility_changed(0.0).is_none());
        assert_eq!(m.state(), RevealState::AwaitingOptionTap);
    }

    #[test]
    fn test_jump_to_end_requires_dwell() {
        let mut m = machine();

        let timer = m.jump_to_end().expect("jump brings end into view");
        // Not at the end yet: the user still has to hold it in view.
        assert_eq!(m.state(), RevealState::Revealing);

        assert!(m.timer_elapsed(timer.token));
        assert_eq!(m.state(), RevealState::AwaitingOptionTap);
    }

    #[test]
    fn test_reset_clears_armed_timer_and_state() {
        let mut m = machine();
        let timer = m.visibility_changed(1.0).unwrap();

        m.reset();
        assert_eq!(m.state(), RevealState::Initializing);

        // Timer from before the reset is stale.
        m.begin();
        assert!(!m.timer_elapsed(timer.token));
        assert_eq!(m.state(), RevealState::Revealing);
    }

    #[test]
    fn test_stale_token_after_retrigger() {
        let mut m = machine();

        let first = m.visibility_changed(0.9).unwrap();
        m.visibility_changed(0.1);
        let second = m.visibility_changed(0.9).unwrap();

        // Order of arrival does not matter; only the armed token counts.
        assert!(!m.timer_elapsed(first.token));
        assert!(m.timer_elapsed(second.token));
    }
}
