//! Mount Lifecycle
//!
//! Everything that runs on its own clock implements [`Timeline`]: the
//! landing typewriter, the assembly sequencer and the flow that switches
//! between them. A timeline is driven by repeatedly asking for its next
//! deadline and advancing it there, either in simulated time (tests) or by
//! the tokio driver in [`crate::driver`].
//!
//! [`MountSlot`] holds at most one live instance and always tears the old one
//! down before the constructor of the next one runs, so timers of a
//! superseded instance can never fire into its replacement.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one mounted instance in logs and snapshots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A self-scheduling state machine with a mount-relative clock
pub trait Timeline {
    /// Observable state handed to renderers
    type Snapshot: Clone + Send + Sync + 'static;

    /// Mount-relative instant of the next scheduled action, if any
    fn next_deadline(&self) -> Option<Duration>;

    /// Apply every action due at or before `now`, in order
    ///
    /// Moving backwards is a no-op.
    fn advance_to(&mut self, now: Duration);

    /// Current observable state
    fn snapshot(&self) -> Self::Snapshot;

    /// Cancel every pending action as one bulk operation
    fn teardown(&mut self);

    /// Whether nothing remains scheduled
    fn is_quiescent(&self) -> bool {
        self.next_deadline().is_none()
    }
}

/// Advance `timeline` deadline by deadline until nothing is scheduled
///
/// Returns the instant of the last action applied.
pub fn run_to_quiescence<T: Timeline>(timeline: &mut T) -> Duration {
    let mut now = Duration::ZERO;
    while let Some(deadline) = timeline.next_deadline() {
        now = now.max(deadline);
        timeline.advance_to(now);
    }
    now
}

/// Owner of at most one mounted instance
#[derive(Debug)]
pub struct MountSlot<T: Timeline> {
    current: Option<T>,
    mounts: u64,
}

impl<T: Timeline> Default for MountSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Timeline> MountSlot<T> {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: None,
            mounts: 0,
        }
    }

    /// Tear down the current instance, then mount a new one
    ///
    /// `mount` runs only after the previous instance's timers are cancelled.
    pub fn remount<F>(&mut self, mount: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.unmount();
        self.mounts += 1;
        self.current.insert(mount())
    }

    /// Fallible variant of [`MountSlot::remount`]
    ///
    /// The previous instance is torn down even when `mount` fails.
    ///
    /// # Errors
    ///
    /// Returns whatever error `mount` produced; the slot is left empty.
    pub fn try_remount<F, E>(&mut self, mount: F) -> Result<&mut T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.unmount();
        let instance = mount()?;
        self.mounts += 1;
        Ok(self.current.insert(instance))
    }

    /// Tear down and discard the current instance
    ///
    /// Returns `false` if nothing was mounted.
    pub fn unmount(&mut self) -> bool {
        match self.current.take() {
            Some(mut instance) => {
                instance.teardown();
                true
            }
            None => false,
        }
    }

    /// The mounted instance
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// The mounted instance, mutably
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut()
    }

    /// Whether an instance is mounted
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current.is_some()
    }

    /// How many instances this slot has mounted over its lifetime
    #[must_use]
    pub fn mounts(&self) -> u64 {
        self.mounts
    }
}

impl<T: Timeline> Drop for MountSlot<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}
