//! Action replay engine.
//!
//! This module turns a pre-hero action log into a timed presentation and
//! drives it against a scheduler.
//!
//! # Overview
//!
//! 1. [`build_replay_sequence`] derives a [`ReplaySequence`]: one step per
//!    action, each with a start offset, seat flags and a narrative fragment.
//! 2. [`generate_full_narrative`] summarizes the log, collapsing runs of
//!    folds into one clause.
//! 3. [`execute_replay_sequence`] schedules step callbacks on a
//!    [`Scheduler`] and returns a [`ReplayHandle`] that cancels them.
//! 4. [`ReplayController`] wraps the executor in an Idle ⇄ Replaying state
//!    machine that owns the UI-facing state.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use preflop_replay::replay::{ControllerOptions, ReplayController, VirtualClock};
//! use preflop_replay::table::ActionEntry;
//!
//! let clock = VirtualClock::new();
//! let history = vec![
//!     ActionEntry::fold(3, "UTG"),
//!     ActionEntry::raise(4, "HJ", 2.5),
//! ];
//! let mut controller =
//!     ReplayController::new(history, Rc::new(clock.clone()), ControllerOptions::new());
//!
//! controller.start_replay();
//! clock.run_until_idle();
//!
//! assert!(!controller.is_replaying());
//! assert_eq!(controller.narrative(), "UTG folds. HJ raises to 2.5BB.");
//! ```
//!
//! # Timing
//!
//! ```text
//! check  300ms   fold  400ms   call  600ms   raise  800ms   all-in  1000ms
//! + 200ms gap after every action; steps complete 50ms before the next starts
//! ```

pub mod config;
pub mod controller;
pub mod effects;
pub mod executor;
pub mod narrative;
pub mod scheduler;
pub mod timeline;

pub use config::{ConfigError, ReplayStats, ReplayTiming};
pub use controller::{ControllerOptions, ReplayController, ReplayEvent, ReplaySnapshot};
pub use effects::{EffectCue, EffectSink, RecordingSink, SharedSink};
pub use executor::{
    execute_replay_sequence, execute_replay_sequence_with, ReplayCallbacks, ReplayHandle,
};
pub use narrative::{generate_action_narrative, generate_full_narrative, EMPTY_NARRATIVE};
pub use scheduler::{Scheduler, Task, TimerId, VirtualClock};
pub use timeline::{
    build_replay_sequence, build_replay_sequence_with, AnimationPhase, ReplaySequence,
    ReplayStep, SeatAnimationState, TerminalState,
};
