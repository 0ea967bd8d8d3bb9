//! Timeline construction.
//!
//! A [`ReplaySequence`] is a pure function of the action log and the timing
//! table. Rebuilding it from the same input always gives the same result,
//! which is what lets a skipped replay land on exactly the state a finished
//! one would have reached.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::config::ReplayTiming;
use super::narrative::{generate_action_narrative, generate_full_narrative};
use crate::table::{ActionEntry, ActionKind, Position};

/// Animation phase of a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationPhase {
    /// Not animating.
    Idle,
    /// Currently acting.
    Acting,
    /// Finished acting.
    Complete,
}

/// Derived presentation flags for the seat that acts in a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAnimationState {
    /// Acting seat.
    pub seat: usize,
    /// Acting position.
    pub position: Position,
    /// The player folded.
    pub is_ghosted: bool,
    /// The player is all-in.
    pub is_all_in: bool,
    /// Chips put in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chip_amount: Option<f64>,
    /// Animation phase.
    pub phase: AnimationPhase,
}

impl SeatAnimationState {
    /// Derive the seat state for an action.
    pub fn from_action(entry: &ActionEntry) -> Self {
        Self {
            seat: entry.seat,
            position: entry.position.clone(),
            is_ghosted: entry.action == ActionKind::Fold,
            is_all_in: entry.action == ActionKind::AllIn,
            chip_amount: entry.amount,
            phase: AnimationPhase::Acting,
        }
    }
}

/// One scheduled unit of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    /// Source action.
    pub action: ActionEntry,
    /// Seat flags derived from it.
    pub seat_state: SeatAnimationState,
    /// Narrative fragment for this action.
    pub narrative_text: String,
    /// Start offset from the beginning of the sequence.
    pub delay_ms: u64,
}

/// Full replay timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySequence {
    /// Steps in action order.
    pub steps: Vec<ReplayStep>,
    /// Offset at which the sequence completes.
    pub total_duration_ms: u64,
    /// Narrative of the whole log.
    pub final_narrative: String,
}

/// Seat sets and narrative a replay ends on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalState {
    /// Every seat that folded.
    pub ghosted_seats: FxHashSet<usize>,
    /// Every seat that went all-in.
    pub all_in_seats: FxHashSet<usize>,
    /// The final narrative.
    pub narrative: String,
}

impl ReplaySequence {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step start offset, or the sequence end past the last step.
    pub fn start_of(&self, index: usize) -> u64 {
        self.steps
            .get(index)
            .map_or(self.total_duration_ms, |step| step.delay_ms)
    }

    /// Compute the state a finished replay ends on, without running it.
    pub fn terminal_state(&self) -> TerminalState {
        let mut terminal = TerminalState {
            narrative: self.final_narrative.clone(),
            ..Default::default()
        };
        for step in &self.steps {
            if step.seat_state.is_ghosted {
                terminal.ghosted_seats.insert(step.seat_state.seat);
            }
            if step.seat_state.is_all_in {
                terminal.all_in_seats.insert(step.seat_state.seat);
            }
        }
        terminal
    }

    /// Check that step start times strictly increase and fit the duration.
    pub fn is_monotonic(&self) -> bool {
        self.steps.windows(2).all(|w| w[0].delay_ms < w[1].delay_ms)
            && self
                .steps
                .last()
                .map_or(true, |last| last.delay_ms < self.total_duration_ms)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Build a replay timeline with the default timing.
pub fn build_replay_sequence(action_history: &[ActionEntry]) -> ReplaySequence {
    build_replay_sequence_with(action_history, &ReplayTiming::default())
}

/// Build a replay timeline with a custom timing table.
///
/// Offsets are strictly increasing only for a table that passes
/// [`ReplayTiming::validate`].
pub fn build_replay_sequence_with(
    action_history: &[ActionEntry],
    timing: &ReplayTiming,
) -> ReplaySequence {
    let mut cumulative_ms = 0;
    let steps = action_history
        .iter()
        .map(|entry| {
            let step = ReplayStep {
                action: entry.clone(),
                seat_state: SeatAnimationState::from_action(entry),
                narrative_text: generate_action_narrative(entry),
                delay_ms: cumulative_ms,
            };
            cumulative_ms += timing.step_span(&entry.action);
            step
        })
        .collect();

    ReplaySequence {
        steps,
        total_duration_ms: cumulative_ms,
        final_narrative: generate_full_narrative(action_history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> Vec<ActionEntry> {
        vec![
            ActionEntry::fold(3, "UTG"),
            ActionEntry::raise(4, "HJ", 2.5),
            ActionEntry::check(5, "CO"),
            ActionEntry::call(0, "BTN", 2.5),
            ActionEntry::all_in(1, "SB", 35.0),
            ActionEntry::new(2, "BB", ActionKind::Unknown("straddle".into()), None),
        ]
    }

    #[test]
    fn test_cumulative_offsets() {
        let seq = build_replay_sequence(&sample_history());
        let delays: Vec<u64> = seq.steps.iter().map(|s| s.delay_ms).collect();

        // fold 400, raise 800, check 300, call 600, all-in 1000, unknown 200; +200 gap each
        assert_eq!(delays, vec![0, 600, 1600, 2100, 2900, 4100]);
        assert_eq!(seq.total_duration_ms, 4500);
        assert!(seq.is_monotonic());
    }

    #[test]
    fn test_seat_flags_follow_action() {
        let seq = build_replay_sequence(&sample_history());
        for step in &seq.steps {
            assert_eq!(step.seat_state.is_ghosted, step.action.action == ActionKind::Fold);
            assert_eq!(step.seat_state.is_all_in, step.action.action == ActionKind::AllIn);
            assert_eq!(step.seat_state.seat, step.action.seat);
            assert_eq!(step.seat_state.phase, AnimationPhase::Acting);
        }
        assert_eq!(seq.steps[1].seat_state.chip_amount, Some(2.5));
    }

    #[test]
    fn test_every_action_in_order() {
        let history = sample_history();
        let seq = build_replay_sequence(&history);
        let actions: Vec<ActionEntry> = seq.steps.iter().map(|s| s.action.clone()).collect();
        assert_eq!(actions, history);
    }

    #[test]
    fn test_empty_history() {
        let seq = build_replay_sequence(&[]);
        assert!(seq.is_empty());
        assert_eq!(seq.total_duration_ms, 0);
        assert_eq!(seq.final_narrative, "Action on you");
    }

    #[test]
    fn test_build_is_deterministic() {
        let history = sample_history();
        let a = build_replay_sequence(&history);
        let b = build_replay_sequence(&history);
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_terminal_state() {
        let history = vec![
            ActionEntry::fold(3, "UTG"),
            ActionEntry::all_in(4, "HJ", 20.0),
            ActionEntry::fold(5, "CO"),
        ];
        let terminal = build_replay_sequence(&history).terminal_state();
        assert_eq!(terminal.ghosted_seats, FxHashSet::from_iter([3, 5]));
        assert_eq!(terminal.all_in_seats, FxHashSet::from_iter([4]));
        assert_eq!(terminal.narrative, "UTG folds. HJ is ALL-IN for 20BB!. CO folds.");
    }

    #[test]
    fn test_custom_timing() {
        let history = sample_history();
        let seq = build_replay_sequence_with(&history, &ReplayTiming::fast());
        assert!(seq.is_monotonic());
        assert_eq!(seq.steps[1].delay_ms, 150);
    }
}
