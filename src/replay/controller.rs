//! Replay controller.
//!
//! [`ReplayController`] owns the UI-facing state of a replay (ghosted and
//! all-in seats, current step, narrative) and moves between two states:
//!
//! ```text
//!            start_replay()
//!   Idle ───────────────────────▶ Replaying
//!    ▲                               │
//!    └───── natural end / skip ◀─────┘
//! ```
//!
//! At most one executor runs per controller. Every path that could start a
//! second one (restart, new action history, dispose) cancels the previous
//! handle first. `skip_replay` and a natural finish land on identical
//! state because both come from the same pure [`ReplaySequence`].
//!
//! Observers and the completion hook may call back into the controller
//! (for example through an `Rc<RefCell<ReplayController>>`). A callback is
//! never re-entered: events raised by its own calls are delivered to the
//! other observers but not back to it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::config::{ReplayStats, ReplayTiming};
use super::effects::SharedSink;
use super::executor::{execute_replay_sequence_with, isolate, ReplayCallbacks, ReplayHandle};
use super::scheduler::Scheduler;
use super::timeline::{build_replay_sequence_with, ReplaySequence, ReplayStep};
use crate::table::ActionEntry;

/// Notification sent to controller subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    /// A replay began.
    Started,
    /// A step started.
    StepStarted(ReplayStep),
    /// A step finished.
    StepCompleted(ReplayStep),
    /// The narrative text changed.
    NarrativeChanged(String),
    /// The replay ended, by skip or by running out.
    Completed {
        /// `true` if ended by [`ReplayController::skip_replay`].
        skipped: bool,
    },
}

/// Point-in-time copy of the controller's derived state.
///
/// Seat lists are sorted so snapshots compare and serialize stably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySnapshot {
    /// A replay is running.
    pub is_replaying: bool,
    /// The step currently shown.
    pub current_step: Option<ReplayStep>,
    /// Folded seats.
    pub ghosted_seats: Vec<usize>,
    /// All-in seats.
    pub all_in_seats: Vec<usize>,
    /// Narrative text.
    pub narrative: String,
}

/// Options fixed for the lifetime of a controller.
#[derive(Default)]
pub struct ControllerOptions {
    auto_start: bool,
    on_complete: Option<CompletionHook>,
    timing: ReplayTiming,
    effects: Option<SharedSink>,
}

impl ControllerOptions {
    /// Default options: no auto start, no hook, default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: start as soon as a sequence is available.
    pub fn with_auto_start(mut self, enable: bool) -> Self {
        self.auto_start = enable;
        self
    }

    /// Builder method: hook run when a replay finishes or is skipped.
    pub fn with_on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Builder method: set the timing table.
    ///
    /// A table that fails [`ReplayTiming::validate`] is replaced by the
    /// default when the controller is built.
    pub fn with_timing(mut self, timing: ReplayTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Builder method: set the audio/haptic sink.
    pub fn with_effects(mut self, sink: SharedSink) -> Self {
        self.effects = Some(sink);
        self
    }
}

#[derive(Debug, Default)]
struct DerivedState {
    is_replaying: bool,
    current_step: Option<ReplayStep>,
    ghosted_seats: FxHashSet<usize>,
    all_in_seats: FxHashSet<usize>,
    narrative: String,
}

type Observer = Rc<RefCell<dyn FnMut(&ReplayEvent)>>;
type CompletionHook = Box<dyn FnMut()>;

/// State reachable from executor callbacks.
#[derive(Default)]
struct Shared {
    state: RefCell<DerivedState>,
    observers: RefCell<Vec<Observer>>,
    on_complete: RefCell<Option<CompletionHook>>,
    stats: RefCell<ReplayStats>,
}

impl Shared {
    fn emit(&self, event: ReplayEvent) {
        let observers: Vec<Observer> = self.observers.borrow().clone();
        let mut panics = 0;
        for observer in &observers {
            let Ok(mut observer) = observer.try_borrow_mut() else {
                trace!(?event, "observer busy, not re-entered");
                continue;
            };
            if !isolate("observer", || (&mut *observer)(&event)) {
                panics += 1;
            }
        }
        self.stats.borrow_mut().callback_panics += panics;
    }

    fn run_completion_hook(&self) {
        let Ok(mut hook) = self.on_complete.try_borrow_mut() else {
            trace!("completion hook busy, not re-entered");
            return;
        };
        let Some(hook) = hook.as_mut() else {
            return;
        };
        if !isolate("on_complete", hook) {
            self.stats.borrow_mut().callback_panics += 1;
        }
    }

    fn set_narrative(&self, text: &str) {
        let changed = {
            let mut state = self.state.borrow_mut();
            if state.narrative == text {
                false
            } else {
                state.narrative = text.to_string();
                true
            }
        };
        if changed {
            self.emit(ReplayEvent::NarrativeChanged(text.to_string()));
        }
    }

    fn step_started(&self, step: &ReplayStep) {
        {
            let mut state = self.state.borrow_mut();
            state.current_step = Some(step.clone());
            if step.seat_state.is_ghosted {
                state.ghosted_seats.insert(step.seat_state.seat);
            }
            if step.seat_state.is_all_in {
                state.all_in_seats.insert(step.seat_state.seat);
            }
        }
        self.emit(ReplayEvent::StepStarted(step.clone()));
    }

    fn finish(&self, skipped: bool) {
        {
            let mut state = self.state.borrow_mut();
            state.is_replaying = false;
            state.current_step = None;
        }
        {
            let mut stats = self.stats.borrow_mut();
            if skipped {
                stats.skipped += 1;
            } else {
                stats.completed += 1;
            }
        }

        // Observers hear about this run ending before the hook can start another.
        self.emit(ReplayEvent::Completed { skipped });
        self.run_completion_hook();
    }
}

/// Idle ⇄ Replaying state machine over one action history.
pub struct ReplayController {
    shared: Rc<Shared>,
    scheduler: Rc<dyn Scheduler>,
    timing: ReplayTiming,
    effects: Option<SharedSink>,
    auto_start: bool,
    sequence: Option<Rc<ReplaySequence>>,
    handle: Option<ReplayHandle>,
    disposed: bool,
}

impl ReplayController {
    /// Create a controller for an action history.
    ///
    /// An empty history yields no sequence, and `start_replay` then does
    /// nothing. With `auto_start` the replay begins immediately.
    pub fn new(
        action_history: Vec<ActionEntry>,
        scheduler: Rc<dyn Scheduler>,
        options: ControllerOptions,
    ) -> Self {
        let ControllerOptions {
            auto_start,
            on_complete,
            timing,
            effects,
        } = options;

        let timing = match timing.validate() {
            Ok(()) => timing,
            Err(e) => {
                warn!(error = %e, "invalid replay timing, using defaults");
                ReplayTiming::default()
            }
        };

        let shared = Shared {
            on_complete: RefCell::new(on_complete),
            ..Default::default()
        };
        let mut controller = Self {
            shared: Rc::new(shared),
            scheduler,
            timing,
            effects,
            auto_start,
            sequence: None,
            handle: None,
            disposed: false,
        };
        controller.load(&action_history);
        controller
    }

    fn load(&mut self, action_history: &[ActionEntry]) {
        self.sequence = if action_history.is_empty() {
            None
        } else {
            Some(Rc::new(build_replay_sequence_with(action_history, &self.timing)))
        };
        debug!(
            actions = action_history.len(),
            duration_ms = self.sequence.as_ref().map_or(0, |s| s.total_duration_ms),
            "replay sequence built"
        );
        if self.auto_start {
            self.start_replay();
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.cancel();
            self.shared.stats.borrow_mut().callback_panics += handle.callback_panics();
        }
    }

    fn callbacks(&self) -> ReplayCallbacks {
        let on_start = self.shared.clone();
        let on_complete = self.shared.clone();
        let on_narrative = self.shared.clone();
        let on_done = self.shared.clone();

        let callbacks = ReplayCallbacks::new()
            .on_step_start(move |step| on_start.step_started(step))
            .on_step_complete(move |step| {
                on_complete.emit(ReplayEvent::StepCompleted(step.clone()))
            })
            .on_narrative_update(move |text| on_narrative.set_narrative(text))
            .on_sequence_complete(move |sequence| {
                on_done.set_narrative(&sequence.final_narrative);
                on_done.finish(false);
            });

        match &self.effects {
            Some(sink) => callbacks.with_effects(sink.clone()),
            None => callbacks,
        }
    }

    /// Begin replaying from a clean slate.
    ///
    /// Does nothing while a replay is running, after disposal, or when the
    /// action history is empty.
    pub fn start_replay(&mut self) {
        if self.disposed || self.is_replaying() {
            return;
        }
        let Some(sequence) = self.sequence.clone() else {
            return;
        };

        self.cancel_in_flight();
        self.shared.state.replace(DerivedState {
            is_replaying: true,
            ..Default::default()
        });
        self.shared.stats.borrow_mut().started += 1;
        debug!(steps = sequence.len(), "replay started");
        self.shared.emit(ReplayEvent::Started);

        let callbacks = self.callbacks();
        self.handle = Some(execute_replay_sequence_with(
            sequence,
            callbacks,
            self.scheduler.clone(),
            self.timing.overlap_ms,
        ));
    }

    /// Jump straight to the end state.
    ///
    /// Cancels any running replay, applies every fold and all-in and the
    /// final narrative without waiting on timers, and runs the completion
    /// hook.
    pub fn skip_replay(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_in_flight();

        if let Some(sequence) = &self.sequence {
            let terminal = sequence.terminal_state();
            {
                let mut state = self.shared.state.borrow_mut();
                state.ghosted_seats = terminal.ghosted_seats;
                state.all_in_seats = terminal.all_in_seats;
            }
            self.shared.set_narrative(&terminal.narrative);
        }

        debug!("replay skipped");
        self.shared.finish(true);
    }

    /// Replace the action history.
    ///
    /// The running replay, if any, is cancelled before the new sequence is
    /// built. Derived state resets to empty.
    pub fn set_action_history(&mut self, action_history: Vec<ActionEntry>) {
        if self.disposed {
            return;
        }
        self.cancel_in_flight();
        self.shared.state.replace(DerivedState::default());
        self.load(&action_history);
    }

    /// Cancel outstanding work. The controller ignores further commands.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_in_flight();
        self.disposed = true;
        debug!("replay controller disposed");
    }

    /// Register an event observer.
    ///
    /// An observer added during a notification first hears the next event.
    pub fn subscribe(&self, observer: impl FnMut(&ReplayEvent) + 'static) {
        self.shared
            .observers
            .borrow_mut()
            .push(Rc::new(RefCell::new(observer)));
    }

    /// Whether a replay is running.
    pub fn is_replaying(&self) -> bool {
        self.shared.state.borrow().is_replaying
    }

    /// The step currently shown.
    pub fn current_step(&self) -> Option<ReplayStep> {
        self.shared.state.borrow().current_step.clone()
    }

    /// Seats shown as folded.
    pub fn ghosted_seats(&self) -> FxHashSet<usize> {
        self.shared.state.borrow().ghosted_seats.clone()
    }

    /// Seats shown as all-in.
    pub fn all_in_seats(&self) -> FxHashSet<usize> {
        self.shared.state.borrow().all_in_seats.clone()
    }

    /// Narrative text.
    pub fn narrative(&self) -> String {
        self.shared.state.borrow().narrative.clone()
    }

    /// The built sequence, if the history was non-empty.
    pub fn sequence(&self) -> Option<&ReplaySequence> {
        self.sequence.as_deref()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Lifetime counters.
    pub fn stats(&self) -> ReplayStats {
        let mut stats = self.shared.stats.borrow().clone();
        if let Some(handle) = &self.handle {
            stats.callback_panics += handle.callback_panics();
        }
        stats
    }

    /// Copy of the derived state.
    pub fn snapshot(&self) -> ReplaySnapshot {
        let state = self.shared.state.borrow();
        let mut ghosted_seats: Vec<usize> = state.ghosted_seats.iter().copied().collect();
        let mut all_in_seats: Vec<usize> = state.all_in_seats.iter().copied().collect();
        ghosted_seats.sort_unstable();
        all_in_seats.sort_unstable();

        ReplaySnapshot {
            is_replaying: state.is_replaying,
            current_step: state.current_step.clone(),
            ghosted_seats,
            all_in_seats,
            narrative: state.narrative.clone(),
        }
    }
}

impl Drop for ReplayController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ReplayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayController")
            .field("state", &self.shared.state.borrow())
            .field("steps", &self.sequence.as_ref().map_or(0, |s| s.len()))
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::scheduler::VirtualClock;
    use crate::table::ActionKind;
    use std::cell::Cell;
    use std::rc::Weak;

    fn history() -> Vec<ActionEntry> {
        vec![
            ActionEntry::fold(3, "UTG"),
            ActionEntry::fold(4, "HJ"),
            ActionEntry::raise(5, "CO", 2.5),
            ActionEntry::all_in(0, "BTN", 40.0),
            ActionEntry::fold(1, "SB"),
        ]
    }

    fn controller_with(
        history: Vec<ActionEntry>,
        options: ControllerOptions,
    ) -> (VirtualClock, ReplayController) {
        let clock = VirtualClock::new();
        let controller = ReplayController::new(history, Rc::new(clock.clone()), options);
        (clock, controller)
    }

    fn counting_hook() -> (Rc<Cell<u32>>, ControllerOptions) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let options = ControllerOptions::new().with_on_complete(move || c.set(c.get() + 1));
        (count, options)
    }

    #[test]
    fn test_starts_idle() {
        let (clock, controller) = controller_with(history(), ControllerOptions::new());
        assert!(!controller.is_replaying());
        assert!(controller.ghosted_seats().is_empty());
        assert_eq!(controller.narrative(), "");
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_natural_completion() {
        let (count, options) = counting_hook();
        let (clock, mut controller) = controller_with(history(), options);

        controller.start_replay();
        assert!(controller.is_replaying());

        clock.advance_to(1);
        assert_eq!(controller.ghosted_seats(), FxHashSet::from_iter([3]));
        assert_eq!(controller.narrative(), "UTG folds");
        assert_eq!(controller.current_step().map(|s| s.action.seat), Some(3));

        clock.run_until_idle();
        assert!(!controller.is_replaying());
        assert!(controller.current_step().is_none());
        assert_eq!(controller.ghosted_seats(), FxHashSet::from_iter([3, 4, 1]));
        assert_eq!(controller.all_in_seats(), FxHashSet::from_iter([0]));
        assert_eq!(
            controller.narrative(),
            "UTG and HJ fold. CO raises to 2.5BB. BTN is ALL-IN for 40BB!. SB folds."
        );
        assert_eq!(count.get(), 1);
        assert_eq!(controller.stats().completed, 1);
    }

    #[test]
    fn test_skip_matches_natural_completion() {
        let (natural_clock, mut natural) = controller_with(history(), ControllerOptions::new());
        natural.start_replay();
        natural_clock.run_until_idle();

        let (count, options) = counting_hook();
        let (clock, mut skipped) = controller_with(history(), options);
        skipped.start_replay();
        clock.advance_to(700);
        skipped.skip_replay();

        assert_eq!(clock.pending(), 0);
        assert_eq!(count.get(), 1);
        assert_eq!(skipped.snapshot(), natural.snapshot());
    }

    #[test]
    fn test_skip_without_start() {
        let (count, options) = counting_hook();
        let (_, mut controller) = controller_with(history(), options);
        controller.skip_replay();

        assert!(!controller.is_replaying());
        assert_eq!(controller.ghosted_seats().len(), 3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (clock, mut controller) = controller_with(history(), ControllerOptions::new());
        controller.start_replay();
        clock.advance_to(1);
        let before = controller.snapshot();
        let pending = clock.pending();

        controller.start_replay();
        assert_eq!(controller.snapshot(), before);
        assert_eq!(clock.pending(), pending);
        assert_eq!(controller.stats().started, 1);
    }

    #[test]
    fn test_restart_after_completion_resets_state() {
        let (clock, mut controller) = controller_with(history(), ControllerOptions::new());
        controller.start_replay();
        clock.run_until_idle();

        controller.start_replay();
        assert!(controller.is_replaying());
        assert!(controller.ghosted_seats().is_empty());
        assert_eq!(controller.narrative(), "");
        clock.run_until_idle();
        assert_eq!(controller.stats().completed, 2);
    }

    #[test]
    fn test_empty_history_never_replays() {
        let (count, options) = counting_hook();
        let (clock, mut controller) = controller_with(vec![], options.with_auto_start(true));
        assert!(controller.sequence().is_none());

        controller.start_replay();
        assert!(!controller.is_replaying());
        assert_eq!(clock.pending(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_auto_start() {
        let (clock, controller) =
            controller_with(history(), ControllerOptions::new().with_auto_start(true));
        assert!(controller.is_replaying());
        assert!(clock.pending() > 0);
    }

    #[test]
    fn test_new_history_cancels_in_flight_run() {
        let (clock, mut controller) = controller_with(history(), ControllerOptions::new());
        controller.start_replay();
        clock.advance_to(1);

        controller.set_action_history(vec![ActionEntry::raise(3, "UTG", 3.0)]);
        assert!(!controller.is_replaying());
        assert_eq!(clock.pending(), 0);
        assert!(controller.ghosted_seats().is_empty());

        controller.start_replay();
        clock.run_until_idle();
        assert_eq!(controller.narrative(), "UTG raises to 3BB.");
        assert!(controller.ghosted_seats().is_empty());
    }

    #[test]
    fn test_dispose_cancels_and_blocks() {
        let (count, options) = counting_hook();
        let (clock, mut controller) = controller_with(history(), options);
        controller.start_replay();
        controller.dispose();
        controller.dispose();

        assert_eq!(clock.pending(), 0);
        controller.start_replay();
        assert_eq!(clock.pending(), 0);
        clock.run_until_idle();
        assert_eq!(count.get(), 0);
        assert!(controller.is_disposed());
    }

    #[test]
    fn test_drop_releases_timers() {
        let (clock, mut controller) = controller_with(history(), ControllerOptions::new());
        controller.start_replay();
        drop(controller);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_events() {
        let (clock, mut controller) = controller_with(
            vec![ActionEntry::fold(3, "UTG"), ActionEntry::call(4, "HJ", 1.0)],
            ControllerOptions::new(),
        );
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        controller.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        controller.start_replay();
        clock.run_until_idle();

        let events = events.borrow();
        assert_eq!(events.first(), Some(&ReplayEvent::Started));
        assert_eq!(events.last(), Some(&ReplayEvent::Completed { skipped: false }));
        let narratives: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::NarrativeChanged(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(narratives, vec!["UTG folds", "HJ calls 1BB", "UTG folds. HJ calls 1BB."]);
        let completed = events
            .iter()
            .filter(|e| matches!(e, ReplayEvent::StepCompleted(_)))
            .count();
        assert_eq!(completed, 2);
    }

    fn recorder(controller: &ReplayController) -> Rc<RefCell<Vec<ReplayEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        controller.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_observer_can_skip_mid_replay() {
        let (count, options) = counting_hook();
        let (clock, controller) = controller_with(history(), options);
        let controller = Rc::new(RefCell::new(controller));
        let events = recorder(&controller.borrow());

        let weak = Rc::downgrade(&controller);
        controller.borrow().subscribe(move |e| {
            if matches!(e, ReplayEvent::StepStarted(_)) {
                if let Some(c) = weak.upgrade() {
                    c.borrow_mut().skip_replay();
                }
            }
        });

        controller.borrow_mut().start_replay();
        clock.advance_to(1);

        assert_eq!(clock.pending(), 0);
        assert_eq!(count.get(), 1);
        {
            let c = controller.borrow();
            assert!(!c.is_replaying());
            assert_eq!(c.ghosted_seats(), FxHashSet::from_iter([3, 4, 1]));
            assert_eq!(c.all_in_seats(), FxHashSet::from_iter([0]));
            let stats = c.stats();
            assert_eq!((stats.skipped, stats.completed, stats.callback_panics), (1, 0, 0));
        }
        assert_eq!(
            events.borrow().last(),
            Some(&ReplayEvent::Completed { skipped: true })
        );

        controller.borrow_mut().start_replay();
        assert!(controller.borrow().is_replaying());
        assert!(clock.pending() > 0);
    }

    #[test]
    fn test_completion_hook_can_restart_replay() {
        let target: Rc<RefCell<Weak<RefCell<ReplayController>>>> =
            Rc::new(RefCell::new(Weak::new()));
        let restarted = Rc::new(Cell::new(false));

        let (t, r) = (target.clone(), restarted.clone());
        let options = ControllerOptions::new().with_on_complete(move || {
            if !r.replace(true) {
                if let Some(c) = t.borrow().upgrade() {
                    c.borrow_mut().start_replay();
                }
            }
        });
        let (clock, controller) = controller_with(
            vec![ActionEntry::fold(3, "UTG"), ActionEntry::raise(4, "HJ", 2.5)],
            options,
        );
        let controller = Rc::new(RefCell::new(controller));
        *target.borrow_mut() = Rc::downgrade(&controller);
        let events = recorder(&controller.borrow());

        controller.borrow_mut().start_replay();
        // fold 0..600, raise 600..1600; the restart's first step is due at 1600 too
        clock.advance_to(1600);
        assert!(controller.borrow().is_replaying());
        assert_eq!(controller.borrow().narrative(), "UTG folds");
        assert_eq!(controller.borrow().ghosted_seats(), FxHashSet::from_iter([3]));

        {
            let events = events.borrow();
            let restart = events
                .iter()
                .rposition(|e| *e == ReplayEvent::Started)
                .unwrap_or(0);
            assert!(restart > 0);
            assert_eq!(events[restart - 1], ReplayEvent::Completed { skipped: false });
            assert!(matches!(
                &events[restart + 1..],
                [ReplayEvent::StepStarted(_), ReplayEvent::NarrativeChanged(t)] if t == "UTG folds"
            ));
        }

        clock.run_until_idle();
        let stats = controller.borrow().stats();
        assert_eq!((stats.started, stats.completed), (2, 2));
        assert!(!controller.borrow().is_replaying());
    }

    #[test]
    fn test_completion_hook_can_skip_without_recursing() {
        let target: Rc<RefCell<Weak<RefCell<ReplayController>>>> =
            Rc::new(RefCell::new(Weak::new()));
        let calls = Rc::new(Cell::new(0));

        let (t, n) = (target.clone(), calls.clone());
        let options = ControllerOptions::new().with_on_complete(move || {
            n.set(n.get() + 1);
            if let Some(c) = t.borrow().upgrade() {
                c.borrow_mut().skip_replay();
            }
        });
        let (clock, controller) = controller_with(history(), options);
        let controller = Rc::new(RefCell::new(controller));
        *target.borrow_mut() = Rc::downgrade(&controller);

        controller.borrow_mut().start_replay();
        clock.run_until_idle();

        assert_eq!(calls.get(), 1);
        let stats = controller.borrow().stats();
        assert_eq!((stats.completed, stats.skipped, stats.callback_panics), (1, 1, 0));
        assert!(!controller.borrow().is_replaying());
    }

    #[test]
    fn test_invalid_timing_falls_back_to_default() {
        let unknown = || ActionEntry::new(3, "UTG", ActionKind::from("limp".to_string()), None);
        let options =
            ControllerOptions::new().with_timing(ReplayTiming::default().with_action_gap(0));
        let (_, controller) = controller_with(vec![unknown(), unknown()], options);

        let sequence = controller.sequence().unwrap();
        assert!(sequence.is_monotonic());
        let delays: Vec<u64> = sequence.steps.iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, vec![0, 400]);
        assert_eq!(sequence.total_duration_ms, 800);
    }

    #[test]
    fn test_panicking_observer_does_not_break_replay() {
        let (count, options) = counting_hook();
        let (clock, mut controller) = controller_with(history(), options);
        controller.subscribe(|e| {
            if matches!(e, ReplayEvent::StepStarted(_)) {
                panic!("observer failure");
            }
        });

        controller.start_replay();
        clock.run_until_idle();
        assert_eq!(count.get(), 1);
        assert_eq!(controller.ghosted_seats().len(), 3);
        assert_eq!(controller.stats().callback_panics, 5);
    }
}
