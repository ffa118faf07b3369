//! Cancellation and the sleep abstraction driving the poll loop.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often [`CancellationToken::run_until_canceled`] looks at the token.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct CancelState {
    canceled: Mutex<bool>,
    changed: Condvar,
}

/// Cloneable, thread-safe cancellation signal.
///
/// Canceling wakes every thread blocked in [`CancellationToken::wait_timeout`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.state
            .canceled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cancel(&self) {
        *self.lock() = true;
        self.state.changed.notify_all();
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        *self.lock()
    }

    /// Block for up to `timeout`. Returns `true` if the token was canceled.
    ///
    /// A timeout too large to represent as an instant waits for cancellation
    /// alone.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut canceled = self.lock();
        while !*canceled {
            canceled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.state
                        .changed
                        .wait_timeout(canceled, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|e| e.into_inner().0)
                }
                None => self
                    .state
                    .changed
                    .wait(canceled)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
        true
    }

    /// Run `work` on a worker thread and wait for its result or for
    /// cancellation, whichever comes first.
    ///
    /// Returns `None` when the token is canceled first or the worker panics.
    /// An abandoned worker keeps running until `work` returns; its result is
    /// dropped.
    pub fn run_until_canceled<T, F>(&self, work: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_canceled() {
            return None;
        }
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone once the caller gave up.
            let _ = tx.send(work());
        });
        loop {
            match rx.recv_timeout(CANCEL_CHECK_INTERVAL) {
                Ok(value) => return Some(value),
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => {
                    if self.is_canceled() {
                        return None;
                    }
                }
            }
        }
    }

    /// Cancel the token once `timeout` elapses, unless canceled earlier.
    pub fn cancel_after(&self, timeout: Duration) -> JoinHandle<()> {
        let token = self.clone();
        thread::spawn(move || {
            if !token.wait_timeout(timeout) {
                tracing::info!(?timeout, "deadline reached, canceling");
                token.cancel();
            }
        })
    }
}

/// How a sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Canceled,
}

/// Source of the delays between poll attempts.
pub trait Scheduler: Send + Sync {
    /// Sleep for `delay`, returning early if `cancel` fires.
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> SleepOutcome;
}

/// Wall-clock scheduler blocking the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> SleepOutcome {
        if cancel.wait_timeout(delay) {
            SleepOutcome::Canceled
        } else {
            SleepOutcome::Elapsed
        }
    }
}

/// Scheduler that never blocks and records every requested delay.
///
/// Intended for tests and dry runs. It can be told to cancel a token on a
/// given sleep to exercise cancellation deterministically.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    delays: Mutex<Vec<Duration>>,
    cancel_on: Option<usize>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token during the `n`-th sleep (1-based).
    #[must_use]
    pub fn cancel_on_sleep(mut self, n: usize) -> Self {
        self.cancel_on = Some(n);
        self
    }

    /// Delays requested so far.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Scheduler for ManualScheduler {
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> SleepOutcome {
        let count = {
            let mut delays = self.delays.lock().unwrap_or_else(PoisonError::into_inner);
            delays.push(delay);
            delays.len()
        };
        if self.cancel_on == Some(count) {
            cancel.cancel();
        }
        if cancel.is_canceled() {
            SleepOutcome::Canceled
        } else {
            SleepOutcome::Elapsed
        }
    }
}
