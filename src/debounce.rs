// ============================================================================
// DEBOUNCE — timer-gated pending batch for rapid numeric-input edits
// ============================================================================

use std::time::{Duration, Instant};

/// Coalesces a burst of edits into one committed value.
///
/// Each `submit` replaces the pending value and pushes the deadline out by
/// the idle interval; the batch commits through `poll` once the deadline
/// passes, or immediately through `flush` when an action that is not a raw
/// keystroke happens (quick-action button, aspect preset).
#[derive(Debug)]
pub struct Debouncer<T> {
    pending: Option<T>,
    deadline: Option<Instant>,
    interval: Duration,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: None,
            deadline: None,
            interval,
        }
    }

    /// Stage a value; extends the quiet-period deadline.
    pub fn submit(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.interval);
    }

    /// Commit the batch if the idle interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.take(),
            _ => None,
        }
    }

    /// Commit the batch immediately, deadline or not.
    pub fn flush(&mut self) -> Option<T> {
        self.take()
    }

    /// The staged, not-yet-committed value, if any.
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    fn take(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }
}
