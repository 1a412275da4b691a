//! # Debounce
//!
//! Cancellable, reschedulable deadline driven by an injected [`Clock`].
//!
//! ```text
//! edit ─┐  edit ─┐      edit ─┐
//!       ↓        ↓            ↓
//! ──────[──────[─────────────[──────────]──→ time
//!        cancel  cancel        quiet period elapses → fire once
//! ```
//!
//! Nothing here sleeps or spawns: the owner calls [`Debouncer::is_due`]
//! (usually through `HistoryManager::poll`) whenever it gets control.

use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Single pending deadline with cancel-and-reschedule semantics
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending deadline with `now + delay`
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending deadline; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the quiet period has fully elapsed
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_pushes_deadline() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(clock.now());
        clock.advance(Duration::from_millis(60));
        debouncer.schedule(clock.now());
        clock.advance(Duration::from_millis(60));
        assert!(!debouncer.is_due(clock.now()));

        clock.advance(Duration::from_millis(40));
        assert!(debouncer.is_due(clock.now()));
    }

    #[test]
    fn test_cancel() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(Duration::ZERO);
        assert!(!debouncer.cancel());
        debouncer.schedule(clock.now());
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        assert!(!debouncer.is_due(clock.now()));
        assert_eq!(debouncer.deadline(), None);
    }
}
