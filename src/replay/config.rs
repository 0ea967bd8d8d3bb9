//! Timing configuration for replay playback.
//!
//! This module provides the delay table that the timeline builder reads,
//! plus a small stats struct filled in by the controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::ActionKind;

/// Delay table for building a replay timeline.
///
/// Each action occupies its base delay plus `action_gap_ms` on the
/// timeline. The executor completes a step `overlap_ms` before the next one
/// starts so consecutive steps crossfade.
///
/// # Example
/// ```
/// use preflop_replay::replay::ReplayTiming;
///
/// let timing = ReplayTiming::default();
/// assert_eq!(timing.fold_ms, 400);
/// assert!(timing.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayTiming {
    /// Quick tap gesture.
    pub check_ms: u64,

    /// Fast fold transition.
    pub fold_ms: u64,

    /// Chip slide and settle.
    pub call_ms: u64,

    /// Chip stack and emphasis.
    pub raise_ms: u64,

    /// Dramatic all-in.
    pub all_in_ms: u64,

    /// Gap added after every action.
    ///
    /// Also used as the base delay of unrecognized actions. Must be
    /// positive so start times stay strictly increasing.
    pub action_gap_ms: u64,

    /// How early a step completes before the next one starts.
    pub overlap_ms: u64,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            check_ms: 300,
            fold_ms: 400,
            call_ms: 600,
            raise_ms: 800,
            all_in_ms: 1000,
            action_gap_ms: 200,
            overlap_ms: 50,
        }
    }
}

impl ReplayTiming {
    /// Create timing with the default delays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay at a quarter of the default, for quick previews.
    pub fn fast() -> Self {
        Self {
            check_ms: 75,
            fold_ms: 100,
            call_ms: 150,
            raise_ms: 200,
            all_in_ms: 250,
            action_gap_ms: 50,
            overlap_ms: 10,
        }
    }

    /// Base delay for an action kind.
    pub fn base_delay(&self, kind: &ActionKind) -> u64 {
        match kind {
            ActionKind::Check => self.check_ms,
            ActionKind::Fold => self.fold_ms,
            ActionKind::Call => self.call_ms,
            ActionKind::Raise => self.raise_ms,
            ActionKind::AllIn => self.all_in_ms,
            ActionKind::Unknown(_) => self.action_gap_ms,
        }
    }

    /// Time an action occupies on the timeline.
    pub fn step_span(&self, kind: &ActionKind) -> u64 {
        self.base_delay(kind) + self.action_gap_ms
    }

    /// Builder method: set the gap between actions.
    pub fn with_action_gap(mut self, gap_ms: u64) -> Self {
        self.action_gap_ms = gap_ms;
        self
    }

    /// Builder method: set the completion overlap.
    pub fn with_overlap(mut self, overlap_ms: u64) -> Self {
        self.overlap_ms = overlap_ms;
        self
    }

    /// Builder method: set the base delay of one action kind.
    ///
    /// Unknown kinds share the action gap and are left untouched.
    pub fn with_delay(mut self, kind: ActionKind, delay_ms: u64) -> Self {
        match kind {
            ActionKind::Check => self.check_ms = delay_ms,
            ActionKind::Fold => self.fold_ms = delay_ms,
            ActionKind::Call => self.call_ms = delay_ms,
            ActionKind::Raise => self.raise_ms = delay_ms,
            ActionKind::AllIn => self.all_in_ms = delay_ms,
            ActionKind::Unknown(_) => {}
        }
        self
    }

    /// Shortest span any step can occupy.
    pub fn min_step_span(&self) -> u64 {
        [
            self.check_ms,
            self.fold_ms,
            self.call_ms,
            self.raise_ms,
            self.all_in_ms,
            self.action_gap_ms,
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
            + self.action_gap_ms
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.action_gap_ms == 0 {
            return Err(ConfigError::ZeroActionGap);
        }

        let min_span = self.min_step_span();
        if self.overlap_ms >= min_span {
            return Err(ConfigError::OverlapTooLarge {
                overlap_ms: self.overlap_ms,
                min_span_ms: min_span,
            });
        }

        Ok(())
    }
}

/// Errors that can occur when validating replay timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A zero gap lets two steps share a start time.
    #[error("action gap must be positive")]
    ZeroActionGap,

    /// A step could complete before it starts.
    #[error("overlap {overlap_ms}ms must be shorter than the shortest step ({min_span_ms}ms)")]
    OverlapTooLarge {
        /// Configured overlap.
        overlap_ms: u64,
        /// Shortest possible step span.
        min_span_ms: u64,
    },
}

/// Counters kept by a controller over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Replays started.
    pub started: u64,

    /// Replays that ran to the end on their own.
    pub completed: u64,

    /// Replays ended by a skip.
    pub skipped: u64,

    /// Callbacks that panicked and were isolated.
    pub callback_panics: u64,
}
