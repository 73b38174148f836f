//! Cancelable single-slot deadline.

use tokio::time::Instant;

/// Holds at most one pending value with the instant it becomes due.
///
/// Scheduling replaces whatever was pending. The owner awaits
/// [`Debounce::deadline`] in its select loop and calls [`Debounce::take_due`].
#[derive(Debug)]
pub struct Debounce<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Debounce<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `value` at `deadline`, returning the value it displaced.
    pub fn schedule(&mut self, deadline: Instant, value: T) -> Option<T> {
        self.pending.replace((deadline, value)).map(|(_, v)| v)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, v)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the value if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if *at <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }
}
