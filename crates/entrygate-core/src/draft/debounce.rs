//! Deterministic debounce.
//!
//! No timers live here: the owner passes `now` into `trigger` and `poll`, so
//! cancellation is a plain state change and tests never sleep.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, DateTime<Utc>)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending value and restart the delay.
    pub fn trigger(&mut self, value: T, now: DateTime<Utc>) {
        self.pending = Some((value, now + self.delay));
    }

    /// Drop the pending value. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending value if its delay has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        match &self.pending {
            Some((_, due)) if *due <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of the delay.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}
