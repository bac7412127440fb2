//! Timer Registry
//!
//! Every scheduled action of an onboarding instance lives in that instance's
//! own [`TimerRegistry`]. Time is virtual and mount-relative: the owner asks
//! the registry for due events with [`TimerRegistry::pop_due`] and applies
//! them one at a time, so handlers never overlap and need no locking.
//!
//! # Ordering
//!
//! Events fire in `(deadline, sequence)` order. Two events armed for the same
//! instant fire in the order they were scheduled.
//!
//! # Teardown
//!
//! [`TimerRegistry::cancel_all`] drops every pending event in one call. An
//! owner that only mutates state from popped events cannot change after its
//! registry has been emptied.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Cancellation handle returned by [`TimerRegistry::schedule`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Sequence number of the scheduled event
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// An event whose deadline has passed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<E> {
    /// Token the event was scheduled under
    pub token: TimerToken,
    /// Mount-relative instant the event was due
    pub deadline: Duration,
    /// The scheduled event
    pub event: E,
}

/// Per-instance registry of pending timed events
#[derive(Debug)]
pub struct TimerRegistry<E> {
    pending: BTreeMap<(Duration, u64), E>,
    deadlines: HashMap<u64, Duration>,
    next_sequence: u64,
    now: Duration,
}

impl<E> Default for TimerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerRegistry<E> {
    /// Create an empty registry with its clock at zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_sequence: 0,
            now: Duration::ZERO,
        }
    }

    /// Current registry time
    ///
    /// While a popped event is being handled this is the event's deadline,
    /// so relative delays scheduled from a handler are measured from the
    /// moment the handler was due.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to fire `delay` after the current registry time
    pub fn schedule(&mut self, event: E, delay: Duration) -> TimerToken {
        self.schedule_at(event, self.now + delay)
    }

    /// Schedule `event` at an absolute mount-relative instant
    ///
    /// Instants in the past are clamped to the current registry time.
    pub fn schedule_at(&mut self, event: E, at: Duration) -> TimerToken {
        let at = at.max(self.now);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.pending.insert((at, sequence), event);
        self.deadlines.insert(sequence, at);
        TimerToken(sequence)
    }

    /// Cancel one pending event
    ///
    /// Returns `false` if the event already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.deadlines.remove(&token.0) {
            Some(at) => self.pending.remove(&(at, token.0)).is_some(),
            None => false,
        }
    }

    /// Cancel every pending event, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        cancelled
    }

    /// Deadline of the earliest pending event
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest event due at or before `now`
    ///
    /// The registry clock moves to the popped event's deadline.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired<E>> {
        let &(at, _) = self.pending.keys().next()?;
        if at > now {
            return None;
        }

        let ((deadline, sequence), event) = self.pending.pop_first()?;
        self.deadlines.remove(&sequence);
        self.now = self.now.max(deadline);

        Some(Fired {
            token: TimerToken(sequence),
            deadline,
            event,
        })
    }

    /// Move the registry clock forward to `now` once due events are drained
    ///
    /// The clock never moves backwards.
    pub fn settle(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Whether `token` is still waiting to fire
    #[must_use]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.deadlines.contains_key(&token.0)
    }

    /// Number of pending events
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is scheduled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
