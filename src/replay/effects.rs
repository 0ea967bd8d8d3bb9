//! Side-effect port for audio and haptic feedback.
//!
//! The executor emits an [`EffectCue`] as each step starts and when the
//! sequence ends. What a cue sounds or feels like is up to the sink the
//! caller passes in; the replay core never plays anything itself.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::table::ActionKind;

/// A feedback cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectCue {
    /// Cards mucked.
    Fold,
    /// Table tap.
    Check,
    /// Chips pushed forward.
    Chips,
    /// All-in emphasis.
    AllIn,
    /// Replay finished.
    SequenceEnd,
}

impl EffectCue {
    /// Cue for an action, if it has one.
    pub fn for_action(kind: &ActionKind) -> Option<Self> {
        match kind {
            ActionKind::Fold => Some(EffectCue::Fold),
            ActionKind::Check => Some(EffectCue::Check),
            ActionKind::Call | ActionKind::Raise => Some(EffectCue::Chips),
            ActionKind::AllIn => Some(EffectCue::AllIn),
            ActionKind::Unknown(_) => None,
        }
    }
}

/// Receiver of feedback cues.
pub trait EffectSink {
    /// Play a cue.
    fn play(&mut self, cue: EffectCue);
}

impl<F: FnMut(EffectCue)> EffectSink for F {
    fn play(&mut self, cue: EffectCue) {
        self(cue)
    }
}

/// A sink shared between the caller and every replay run.
pub type SharedSink = Rc<RefCell<dyn EffectSink>>;

/// Sink that keeps every cue it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    cues: Vec<EffectCue>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues received so far.
    pub fn cues(&self) -> &[EffectCue] {
        &self.cues
    }
}

impl EffectSink for RecordingSink {
    fn play(&mut self, cue: EffectCue) {
        self.cues.push(cue);
    }
}
