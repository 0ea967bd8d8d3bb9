//! Timer scheduling.
//!
//! Replay never sleeps. It hands delayed tasks to a [`Scheduler`] and lets
//! whoever owns the scheduler decide how time passes. [`VirtualClock`] is
//! the only implementation: tests advance it by hand, and
//! [`VirtualClock::run_realtime`] drives it from the wall clock.
//!
//! Everything here is single-threaded. Task bodies run to completion one
//! at a time, in deadline order, with ties broken by scheduling order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use tracing::trace;

/// A delayed unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Handle to a scheduled task.
///
/// Ordering follows firing order: deadline first, then scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline_ms: u64,
    seq: u64,
}

impl TimerId {
    /// Absolute time the task fires at.
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }
}

/// A source of cancellable delayed tasks.
pub trait Scheduler {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Run `task` once `delay_ms` have passed.
    fn schedule(&self, delay_ms: u64, task: Task) -> TimerId;

    /// Release a pending task. Returns `false` if it already ran or was
    /// already cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

#[derive(Default)]
struct ClockInner {
    now_ms: u64,
    next_seq: u64,
    pending: BTreeMap<TimerId, Task>,
}

/// Deterministic timer queue with manually advanced time.
///
/// Clones share the same queue, so a test can keep one clone and hand
/// another to the code under test.
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use preflop_replay::replay::{Scheduler, VirtualClock};
///
/// let clock = VirtualClock::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
/// clock.schedule(100, Box::new(move || flag.set(true)));
///
/// clock.advance_by(99);
/// assert!(!fired.get());
/// clock.advance_by(1);
/// assert!(fired.get());
/// ```
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl VirtualClock {
    /// Create a clock at time zero with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Deadline of the next task, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.inner
            .borrow()
            .pending
            .keys()
            .next()
            .map(|id| id.deadline_ms)
    }

    /// Pop the next task due at or before `target_ms`, moving time to it.
    fn pop_due(&self, target_ms: u64) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();
        let id = *inner.pending.keys().next()?;
        if id.deadline_ms > target_ms {
            return None;
        }
        inner.now_ms = inner.now_ms.max(id.deadline_ms);
        inner.pending.remove(&id)
    }

    /// Run every task due up to `target_ms`, then set the time to it.
    ///
    /// Tasks run without the queue borrowed, so they may schedule or cancel
    /// other tasks. A task cancelled by an earlier one never runs. Returns
    /// the number of tasks run.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut fired = 0;
        while let Some(task) = self.pop_due(target_ms) {
            task();
            fired += 1;
        }
        let mut inner = self.inner.borrow_mut();
        inner.now_ms = inner.now_ms.max(target_ms);
        trace!(now_ms = inner.now_ms, fired, "clock advanced");
        fired
    }

    /// Advance time by `delta_ms`.
    pub fn advance_by(&self, delta_ms: u64) -> usize {
        let target = self.now_ms() + delta_ms;
        self.advance_to(target)
    }

    /// Run tasks until none are left.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            fired += self.advance_to(deadline);
        }
        fired
    }

    /// Run tasks until none are left, sleeping between deadlines.
    ///
    /// `speed` scales playback: 2.0 runs twice as fast as real time.
    /// Non-positive speeds run without sleeping.
    pub fn run_realtime(&self, speed: f64) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            let wait_ms = deadline.saturating_sub(self.now_ms());
            if speed > 0.0 && wait_ms > 0 {
                thread::sleep(Duration::from_secs_f64(wait_ms as f64 / 1000.0 / speed));
            }
            fired += self.advance_to(deadline);
        }
        fired
    }
}

impl Scheduler for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    fn schedule(&self, delay_ms: u64, task: Task) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId {
            deadline_ms: inner.now_ms + delay_ms,
            seq: inner.next_seq,
        };
        inner.next_seq += 1;
        inner.pending.insert(id, task);
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().pending.remove(&id).is_some()
    }
}

impl fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("VirtualClock")
            .field("now_ms", &inner.now_ms)
            .field("pending", &inner.pending.len())
            .finish()
    }
}
