//! Replay execution.
//!
//! [`execute_replay_sequence`] turns a built timeline into timers on a
//! [`Scheduler`]:
//!
//! ```text
//!  step 0 start        step 1 start        ...    sequence end
//!  |-------------------|--------------------------|
//!             step 0 complete (overlap early)     onSequenceComplete
//! ```
//!
//! Every timer checks a shared abort flag before touching any callback, so
//! once [`ReplayHandle::cancel`] returns nothing else runs, even a timer
//! that is already due. Each callback runs isolated: a panicking consumer
//! is logged and counted, and later timers fire as normal.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::config::ReplayTiming;
use super::effects::{EffectCue, SharedSink};
use super::scheduler::{Scheduler, TimerId};
use super::timeline::{ReplaySequence, ReplayStep};

type StepCallback = Box<dyn FnMut(&ReplayStep)>;
type SequenceCallback = Box<dyn FnMut(&ReplaySequence)>;
type NarrativeCallback = Box<dyn FnMut(&str)>;

/// Consumers notified as a replay runs. Every field is optional.
#[derive(Default)]
pub struct ReplayCallbacks {
    on_step_start: Option<StepCallback>,
    on_step_complete: Option<StepCallback>,
    on_sequence_complete: Option<SequenceCallback>,
    on_narrative_update: Option<NarrativeCallback>,
    effects: Option<SharedSink>,
}

impl ReplayCallbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when a step starts.
    pub fn on_step_start(mut self, f: impl FnMut(&ReplayStep) + 'static) -> Self {
        self.on_step_start = Some(Box::new(f));
        self
    }

    /// Called shortly before the next step starts.
    pub fn on_step_complete(mut self, f: impl FnMut(&ReplayStep) + 'static) -> Self {
        self.on_step_complete = Some(Box::new(f));
        self
    }

    /// Called once the whole sequence has played.
    pub fn on_sequence_complete(mut self, f: impl FnMut(&ReplaySequence) + 'static) -> Self {
        self.on_sequence_complete = Some(Box::new(f));
        self
    }

    /// Called with each step's fragment, then with the final narrative.
    pub fn on_narrative_update(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_narrative_update = Some(Box::new(f));
        self
    }

    /// Sink for audio/haptic cues.
    pub fn with_effects(mut self, sink: SharedSink) -> Self {
        self.effects = Some(sink);
        self
    }
}

/// Run `f`, catching a panic. Returns `false` if it panicked.
pub(crate) fn isolate(name: &'static str, f: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(_) => {
            warn!(callback = name, "replay callback panicked, continuing");
            false
        }
    }
}

/// State shared by every timer of one run.
struct Run {
    sequence: Rc<ReplaySequence>,
    callbacks: RefCell<ReplayCallbacks>,
    aborted: Cell<bool>,
    finished: Cell<bool>,
    panics: Cell<u64>,
}

impl Run {
    fn guarded(&self, name: &'static str, f: impl FnOnce(&mut ReplayCallbacks)) {
        if self.aborted.get() {
            return;
        }
        let mut callbacks = self.callbacks.borrow_mut();
        if !isolate(name, || f(&mut *callbacks)) {
            self.panics.set(self.panics.get() + 1);
        }
    }

    fn cue(&self, cue: EffectCue) {
        self.guarded("effects", |cb| {
            if let Some(sink) = &cb.effects {
                sink.borrow_mut().play(cue);
            }
        });
    }

    fn start_step(&self, index: usize) {
        if self.aborted.get() {
            return;
        }
        let step = &self.sequence.steps[index];
        trace!(index, delay_ms = step.delay_ms, "step start");

        self.guarded("on_step_start", |cb| {
            if let Some(f) = cb.on_step_start.as_mut() {
                f(step);
            }
        });
        if let Some(cue) = EffectCue::for_action(&step.action.action) {
            self.cue(cue);
        }
        self.guarded("on_narrative_update", |cb| {
            if let Some(f) = cb.on_narrative_update.as_mut() {
                f(&step.narrative_text);
            }
        });
    }

    fn complete_step(&self, index: usize) {
        if self.aborted.get() {
            return;
        }
        let step = &self.sequence.steps[index];
        trace!(index, "step complete");

        self.guarded("on_step_complete", |cb| {
            if let Some(f) = cb.on_step_complete.as_mut() {
                f(step);
            }
        });
    }

    fn complete_sequence(&self) {
        if self.aborted.get() {
            return;
        }
        debug!(
            steps = self.sequence.len(),
            duration_ms = self.sequence.total_duration_ms,
            "replay sequence complete"
        );

        let sequence = &self.sequence;
        self.guarded("on_sequence_complete", |cb| {
            if let Some(f) = cb.on_sequence_complete.as_mut() {
                f(sequence);
            }
        });
        self.cue(EffectCue::SequenceEnd);
        self.guarded("on_narrative_update", |cb| {
            if let Some(f) = cb.on_narrative_update.as_mut() {
                f(&sequence.final_narrative);
            }
        });

        // A cancel from inside the final callbacks means the run did not finish.
        if !self.aborted.get() {
            self.finished.set(true);
        }
    }
}

/// Cancellation handle for a running replay.
///
/// Dropping the handle cancels the replay.
#[must_use = "dropping a ReplayHandle cancels the replay"]
pub struct ReplayHandle {
    run: Rc<Run>,
    timers: Vec<TimerId>,
    scheduler: Rc<dyn Scheduler>,
}

impl ReplayHandle {
    /// Stop the replay and release every pending timer.
    ///
    /// Takes effect immediately. Calling it again, or after the replay
    /// finished, does nothing.
    pub fn cancel(&mut self) {
        if !self.run.aborted.replace(true) && !self.run.finished.get() {
            debug!(pending = self.timers.len(), "replay cancelled");
        }
        for id in self.timers.drain(..) {
            self.scheduler.cancel(id);
        }
    }

    /// Whether [`cancel`](Self::cancel) stopped the replay before it ended.
    pub fn is_cancelled(&self) -> bool {
        self.run.aborted.get() && !self.run.finished.get()
    }

    /// Whether the replay played to the end.
    pub fn is_finished(&self) -> bool {
        self.run.finished.get()
    }

    /// Number of callbacks that panicked during this run.
    pub fn callback_panics(&self) -> u64 {
        self.run.panics.get()
    }
}

impl Drop for ReplayHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Schedule a replay with the default completion overlap.
pub fn execute_replay_sequence(
    sequence: Rc<ReplaySequence>,
    callbacks: ReplayCallbacks,
    scheduler: Rc<dyn Scheduler>,
) -> ReplayHandle {
    let overlap_ms = ReplayTiming::default().overlap_ms;
    execute_replay_sequence_with(sequence, callbacks, scheduler, overlap_ms)
}

/// Schedule a replay.
///
/// Each step gets a start timer at its `delay_ms` and a complete timer
/// `overlap_ms` before the next step starts (or before the sequence ends),
/// never earlier than its own start. A final timer at `total_duration_ms`
/// completes the sequence. Offsets are relative to the scheduler's current
/// time.
pub fn execute_replay_sequence_with(
    sequence: Rc<ReplaySequence>,
    callbacks: ReplayCallbacks,
    scheduler: Rc<dyn Scheduler>,
    overlap_ms: u64,
) -> ReplayHandle {
    let run = Rc::new(Run {
        sequence: sequence.clone(),
        callbacks: RefCell::new(callbacks),
        aborted: Cell::new(false),
        finished: Cell::new(false),
        panics: Cell::new(0),
    });

    let mut timers = Vec::with_capacity(sequence.len() * 2 + 1);

    for (index, step) in sequence.steps.iter().enumerate() {
        let start_run = run.clone();
        timers.push(scheduler.schedule(
            step.delay_ms,
            Box::new(move || start_run.start_step(index)),
        ));

        let complete_at = sequence
            .start_of(index + 1)
            .saturating_sub(overlap_ms)
            .max(step.delay_ms);
        let complete_run = run.clone();
        timers.push(scheduler.schedule(
            complete_at,
            Box::new(move || complete_run.complete_step(index)),
        ));
    }

    let final_run = run.clone();
    timers.push(scheduler.schedule(
        sequence.total_duration_ms,
        Box::new(move || final_run.complete_sequence()),
    ));

    debug!(
        steps = sequence.len(),
        timers = timers.len(),
        duration_ms = sequence.total_duration_ms,
        "replay scheduled"
    );

    ReplayHandle {
        run,
        timers,
        scheduler,
    }
}
