//! Timers for a single-threaded event loop.
//!
//! The runtime never sleeps or spawns threads. Anything time-based (hover
//! delays, exit transitions, readiness retries) goes through [`Scheduler`],
//! which a host implements on top of its own event loop (`setTimeout` in a
//! browser). [`ManualScheduler`] is a virtual clock for tests and headless
//! hosts.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Handle of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A deferred task.
pub type Task = Box<dyn FnOnce()>;

/// One-shot timer service.
pub trait Scheduler {
    /// Current time since the scheduler's epoch.
    fn now(&self) -> Duration;

    /// Run `task` once after `delay`.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a pending task. Returns `false` if it already ran or was cleared.
    fn clear_timeout(&self, id: TimerId) -> bool;
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Tasks due at the same instant run in scheduling order. Tasks scheduled
/// while advancing run in the same call if they fall due before the target
/// time.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerId), Task>>,
}

/// Upper bound on tasks executed by [`ManualScheduler::run_until_idle`].
const IDLE_STEP_LIMIT: usize = 10_000;

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Deadline of the earliest pending task.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow().keys().next().map(|(at, _)| *at)
    }

    /// Move the clock forward by `by`, running every task that falls due.
    ///
    /// Returns the number of tasks executed.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    /// Jump from deadline to deadline until no task is left.
    ///
    /// Stops after a fixed number of tasks so that a self-rescheduling task
    /// cannot hang the caller. Returns the number of tasks executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while ran < IDLE_STEP_LIMIT {
            let Some(deadline) = self.next_deadline() else {
                break;
            };
            let Some(task) = self.pop_due(deadline) else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, limit: Duration) -> Option<Task> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = queue.remove(&key)?;
        if key.0 > self.now.get() {
            self.now.set(key.0);
        }
        Some(task)
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, id), task);
        id
    }

    fn clear_timeout(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let key = queue.keys().find(|(_, timer)| *timer == id).copied();
        match key {
            Some(key) => queue.remove(&key).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_runs_due_tasks_in_order() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            scheduler.set_timeout(ms(delay), Box::new(move || log.borrow_mut().push(label)));
        }

        assert_eq!(scheduler.advance(ms(25)), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(scheduler.now(), ms(25));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_clear_timeout() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = scheduler.set_timeout(ms(5), Box::new(move || flag.set(true)));

        assert!(scheduler.clear_timeout(id));
        assert!(!scheduler.clear_timeout(id));
        scheduler.advance(ms(10));
        assert!(!fired.get());
    }

    #[test]
    fn test_nested_scheduling_within_advance() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_count = count.clone();
        scheduler.set_timeout(
            ms(10),
            Box::new(move || {
                inner_count.set(inner_count.get() + 1);
                let nested = inner_count.clone();
                inner_scheduler.set_timeout(ms(10), Box::new(move || nested.set(nested.get() + 1)));
            }),
        );

        scheduler.advance(ms(20));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_run_until_idle_moves_clock() {
        let scheduler = ManualScheduler::new();
        scheduler.set_timeout(ms(300), Box::new(|| {}));
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(scheduler.now(), ms(300));
    }
}
