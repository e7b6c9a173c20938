//! Bounded retry with backoff on top of a [`Scheduler`].
//!
//! Used wherever the runtime has to poll for something that has no reliable
//! "ready" signal, such as a palette container that the host editor mounts
//! at some unknown point after start-up.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::schedule::{Scheduler, TimerId};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay after every attempt.
    Fixed(Duration),
    /// `initial + step * (attempt - 1)`.
    Linear { initial: Duration, step: Duration },
    /// `initial * factor^(attempt - 1)`, capped at `max`.
    Exponential {
        initial: Duration,
        factor: u32,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let n = attempt.saturating_sub(1);
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear { initial, step } => initial.saturating_add(step.saturating_mul(n)),
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let multiplier = factor.max(1).checked_pow(n).unwrap_or(u32::MAX);
                initial.saturating_mul(multiplier).min(max)
            }
        }
    }
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Sum of every delay the policy can wait before giving up.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts.max(1)).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.backoff.delay(attempt))
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(50),
                factor: 2,
                max: Duration::from_secs(1),
            },
        }
    }
}

/// Final state of a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Still waiting for the next attempt.
    Pending,
    /// The attempt with this number reported success.
    Succeeded { attempt: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
    Cancelled,
}

type AttemptFn = Box<dyn FnMut(u32) -> bool>;
type ExhaustedFn = Box<dyn FnOnce(u32)>;

struct RetryState {
    scheduler: Rc<dyn Scheduler>,
    policy: RetryPolicy,
    attempts: Cell<u32>,
    outcome: Cell<RetryOutcome>,
    timer: Cell<Option<TimerId>>,
    attempt: RefCell<Option<AttemptFn>>,
    on_exhausted: RefCell<Option<ExhaustedFn>>,
}

/// Handle to a running retry loop.
#[derive(Clone)]
pub struct Retry {
    state: Rc<RetryState>,
}

/// Run `attempt` now and, while it returns `false`, again after each backoff
/// delay until it succeeds or `policy.max_attempts` is reached.
///
/// `attempt` receives the 1-based attempt number. `on_exhausted` runs once
/// with the number of attempts made if none succeeded. The first attempt runs
/// synchronously before this function returns.
pub fn retry(
    scheduler: Rc<dyn Scheduler>,
    policy: RetryPolicy,
    attempt: impl FnMut(u32) -> bool + 'static,
    on_exhausted: impl FnOnce(u32) + 'static,
) -> Retry {
    let state = Rc::new(RetryState {
        scheduler,
        policy,
        attempts: Cell::new(0),
        outcome: Cell::new(RetryOutcome::Pending),
        timer: Cell::new(None),
        attempt: RefCell::new(Some(Box::new(attempt))),
        on_exhausted: RefCell::new(Some(Box::new(on_exhausted))),
    });
    run_attempt(&state);
    Retry { state }
}

fn run_attempt(state: &Rc<RetryState>) {
    state.timer.set(None);
    if state.outcome.get() != RetryOutcome::Pending {
        return;
    }

    let n = state.attempts.get() + 1;
    state.attempts.set(n);

    // Taken out of the cell so the callback may inspect or cancel this retry.
    let Some(mut attempt) = state.attempt.borrow_mut().take() else {
        return;
    };
    let done = attempt(n);

    if state.outcome.get() == RetryOutcome::Cancelled {
        return;
    }
    if done {
        state.outcome.set(RetryOutcome::Succeeded { attempt: n });
        state.on_exhausted.borrow_mut().take();
        return;
    }
    if n >= state.policy.max_attempts.max(1) {
        state.outcome.set(RetryOutcome::Exhausted { attempts: n });
        if let Some(on_exhausted) = state.on_exhausted.borrow_mut().take() {
            on_exhausted(n);
        }
        return;
    }

    *state.attempt.borrow_mut() = Some(attempt);
    let next = state.clone();
    let timer = state.scheduler.set_timeout(
        state.policy.backoff.delay(n),
        Box::new(move || run_attempt(&next)),
    );
    state.timer.set(Some(timer));
}

impl Retry {
    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.state.attempts.get()
    }

    pub fn outcome(&self) -> RetryOutcome {
        self.state.outcome.get()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome() != RetryOutcome::Pending
    }

    /// Stop scheduling further attempts. No-op once finished.
    pub fn cancel(&self) {
        if self.is_finished() {
            return;
        }
        self.state.outcome.set(RetryOutcome::Cancelled);
        if let Some(timer) = self.state.timer.take() {
            self.state.scheduler.clear_timeout(timer);
        }
        self.state.attempt.borrow_mut().take();
        self.state.on_exhausted.borrow_mut().take();
    }
}

impl std::fmt::Debug for Retry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("attempts", &self.attempts())
            .field("outcome", &self.outcome())
            .finish()
    }
}
