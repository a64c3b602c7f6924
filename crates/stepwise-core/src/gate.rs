//! Minimum-duration busy gate
//!
//! Wraps an asynchronous operation so that the externally visible busy flag
//! stays raised for at least a configured duration, even when the operation
//! resolves almost immediately. The flag is lowered no later than
//! `max(operation duration, minimum duration)`.
//!
//! Time comes from `tokio::time`, so tests can run on a paused clock.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::defaults;

/// How much longer the busy flag must stay raised
///
/// Zero once `elapsed` has reached `min`.
pub fn hold_remaining(min: Duration, elapsed: Duration) -> Duration {
    min.saturating_sub(elapsed)
}

// ============================================================================
// BusySignal
// ============================================================================

/// Observable busy flag shared by every gated call of one engine
///
/// Each [`raise`](Self::raise) starts a new generation. A guard only lowers
/// the flag if its generation is still the latest, so a cancelled call that
/// finishes late cannot clear the flag of a newer call.
#[derive(Debug)]
pub struct BusySignal {
    tx: watch::Sender<bool>,
    generation: AtomicU64,
}

impl Default for BusySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl BusySignal {
    /// Create a lowered signal
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Raise the flag; it stays up until the guard is dropped
    pub fn raise(&self) -> BusyGuard<'_> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx.send_replace(true);
        BusyGuard {
            signal: self,
            generation,
        }
    }

    /// Lower the flag unconditionally and invalidate outstanding guards
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.tx.send_replace(false);
    }

    /// Current flag value
    pub fn is_busy(&self) -> bool {
        *self.tx.borrow()
    }

    /// Watch the flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn release(&self, generation: u64) {
        if self.generation.load(Ordering::Acquire) == generation {
            self.tx.send_replace(false);
        }
    }
}

/// Keeps a [`BusySignal`] raised while alive
#[derive(Debug)]
pub struct BusyGuard<'a> {
    signal: &'a BusySignal,
    generation: u64,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.signal.release(self.generation);
    }
}

// ============================================================================
// LoadingGate
// ============================================================================

/// Runs operations with a minimum busy duration
#[derive(Debug)]
pub struct LoadingGate {
    min_duration: Duration,
    signal: BusySignal,
}

impl Default for LoadingGate {
    fn default() -> Self {
        Self::new(defaults::MIN_BUSY_DURATION)
    }
}

impl LoadingGate {
    /// Create a gate holding the busy flag for at least `min_duration`
    pub fn new(min_duration: Duration) -> Self {
        Self {
            min_duration,
            signal: BusySignal::new(),
        }
    }

    /// Configured minimum busy duration
    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    /// The busy flag this gate drives
    pub fn signal(&self) -> &BusySignal {
        &self.signal
    }

    /// Run `operation` with the busy flag raised
    ///
    /// 1. raises the flag, then records the start time
    /// 2. awaits the operation
    /// 3. waits out the rest of the minimum duration, if any
    /// 4. lowers the flag and returns the operation's output
    ///
    /// There is no timeout: an operation that never resolves keeps the gate
    /// (and the flag) up forever. Failures pass through untouched since the
    /// output is returned as-is.
    pub async fn run<F>(&self, operation: F) -> F::Output
    where
        F: Future,
    {
        let guard = self.signal.raise();
        let output = self.hold_from(Instant::now(), operation).await;
        drop(guard);
        output
    }

    /// Like [`run`](Self::run), measuring the minimum duration from `started`
    pub async fn run_since<F>(&self, started: Instant, operation: F) -> F::Output
    where
        F: Future,
    {
        let guard = self.signal.raise();
        let output = self.hold_from(started, operation).await;
        drop(guard);
        output
    }

    async fn hold_from<F>(&self, started: Instant, operation: F) -> F::Output
    where
        F: Future,
    {
        let output = operation.await;
        let remaining = hold_remaining(self.min_duration, started.elapsed());
        if !remaining.is_zero() {
            tracing::trace!(remaining_ms = remaining.as_millis() as u64, "holding busy flag");
            tokio::time::sleep(remaining).await;
        }
        output
    }
}
