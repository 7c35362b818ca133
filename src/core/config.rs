//! Engine configuration with documented constants
//!
//! The reference behavior of the quiz is driven by a handful of tuning
//! values. They are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the playback and scoring engine
///
/// These values reproduce the reference behavior of the app. Changing
/// them alters pacing and scoring for every scenario.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === SCORING ===
    /// Points awarded the first time a scenario is completed correctly
    ///
    /// Awarded at most once per scenario id. Completing a scenario with
    /// an unsafe choice marks it completed but awards nothing, and a
    /// later correct attempt does not re-award.
    pub completion_award: u32,

    // === TRANSCRIPT REVEAL ===
    /// Minimum continuous time the final message must stay visible
    /// before options unlock (milliseconds)
    ///
    /// Partial dwell never carries over. If visibility is interrupted
    /// at 900ms of a 1000ms dwell, a fresh uninterrupted 1000ms is
    /// required.
    pub dwell_duration_ms: u64,

    /// Fraction of the final message's area that must be on screen for
    /// it to count as visible (0.0..=1.0)
    ///
    /// At 0.8, small scroll jitter that keeps most of the message in
    /// view does not interrupt the dwell timer.
    pub visibility_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            completion_award: 20,
            dwell_duration_ms: 1000,
            visibility_threshold: 0.8,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.visibility_threshold <= 0.0 || self.visibility_threshold > 1.0 {
            return Err(format!(
                "visibility_threshold ({}) must be within (0.0, 1.0]",
                self.visibility_threshold
            ));
        }

        if self.dwell_duration_ms == 0 {
            return Err("dwell_duration_ms must be positive".into());
        }

        Ok(())
    }
}
