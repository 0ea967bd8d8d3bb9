//! # Preflop Replay
//!
//! Deterministic replay of the action that happens before the hero acts in
//! a preflop training hand.
//!
//! ## Features
//!
//! - **Seat Resolution**: Maps position labels to absolute seats for 2-, 6-
//!   and 9-max tables and builds stacked rosters
//! - **Timeline Builder**: Pure, strictly monotonic presentation timeline
//! - **Narratives**: "UTG, MP and CO fold. BTN raises to 3BB."
//! - **Cancellable Execution**: Timers on an injectable scheduler, with
//!   synchronous, idempotent cancellation
//! - **Controller**: Restartable Idle ⇄ Replaying state machine where skip
//!   and natural completion converge on the same state
//!
//! ## Quick Start
//!
//! ```ignore
//! use preflop_replay::table::StartingState;
//! use preflop_replay::replay::{ReplayController, ControllerOptions, VirtualClock};
//!
//! // 1. Load a hand
//! let hand = StartingState::load("hand.json")?;
//!
//! // 2. Create a controller on a clock
//! let clock = VirtualClock::new();
//! let mut controller = ReplayController::new(
//!     hand.action_history.clone(),
//!     Rc::new(clock.clone()),
//!     ControllerOptions::new(),
//! );
//!
//! // 3. Play it
//! controller.start_replay();
//! clock.run_realtime(1.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  action log  │
//! └──────┬───────┘
//!        ├────────────────────────┐
//!        ▼                        ▼
//! ┌──────────────┐        ┌──────────────┐
//! │   Timeline   │        │  Narrative   │
//! └──────┬───────┘        └──────┬───────┘
//!        └──────────┬─────────────┘
//!                   ▼
//!           ┌──────────────┐    schedules    ┌────────────┐
//!           │   Executor   │ ──────────────▶ │ Scheduler  │
//!           └──────┬───────┘                 └────────────┘
//!                  ▼
//!           ┌──────────────┐
//!           │  Controller  │ ──▶ UI observers
//!           └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`table`]: Action log data model and seat resolution
//! - [`replay`]: Timeline, narrative, scheduling and the controller

#![warn(missing_docs)]

/// Table data model.
///
/// Actions, positions, table sizes and the seat resolver.
pub mod table;

/// Replay engine.
///
/// Everything between an action log and UI state over time.
pub mod replay;

// Re-export commonly used types at crate root for convenience
pub use replay::{
    build_replay_sequence, generate_full_narrative, ControllerOptions, ReplayController,
    ReplaySequence, ReplayTiming, Scheduler, VirtualClock,
};
pub use table::{ActionEntry, ActionKind, Position, StartingState, Topology};
