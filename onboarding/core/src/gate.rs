//! Completion Gate
//!
//! Holds the host's completion callback. The callback is an `FnOnce` that is
//! moved out when fired, so a second delivery cannot be expressed.

use std::fmt;

/// Zero-argument notification handed over by the host
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// At-most-once delivery of the completion notification
pub struct CompletionGate {
    callback: Option<CompletionCallback>,
    fired: bool,
}

impl CompletionGate {
    /// Arm the gate with the host's callback
    pub fn new<F>(on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            callback: Some(Box::new(on_complete)),
            fired: false,
        }
    }

    /// Deliver the notification
    ///
    /// Returns `false` if it was already delivered or the gate was disarmed.
    pub fn fire(&mut self) -> bool {
        match self.callback.take() {
            Some(callback) => {
                self.fired = true;
                callback();
                true
            }
            None => false,
        }
    }

    /// Drop the callback without calling it
    ///
    /// Returns `true` if a pending callback was discarded.
    pub fn disarm(&mut self) -> bool {
        self.callback.take().is_some()
    }

    /// Whether the notification was delivered
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Whether a callback is still waiting
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for CompletionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionGate")
            .field("armed", &self.is_armed())
            .field("fired", &self.fired)
            .finish()
    }
}
