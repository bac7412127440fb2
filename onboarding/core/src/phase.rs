//! Assembly Phases
//!
//! `Intro → Assembling → Final → Exit → Done`, strictly forward, one step at a
//! time. Every later phase is armed independently at mount against its own
//! absolute offset ([`PhaseSchedule`]) instead of being chained from the
//! previous phase, so scheduling drift never compounds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One stage of the assembly sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Sequencer just mounted
    Intro,
    /// Elements are flying into orbit
    Assembling,
    /// Everything has merged; holding the final frame
    Final,
    /// Fading out
    Exit,
    /// Terminal; the host has been notified
    Done,
}

impl Phase {
    /// Every phase in visiting order
    pub const ALL: [Phase; 5] = [
        Phase::Intro,
        Phase::Assembling,
        Phase::Final,
        Phase::Exit,
        Phase::Done,
    ];

    /// The phase that follows this one
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        match self {
            Self::Intro => Some(Self::Assembling),
            Self::Assembling => Some(Self::Final),
            Self::Final => Some(Self::Exit),
            Self::Exit => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Whether this is the last phase
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Console status line shown while in this phase
    #[must_use]
    pub fn status_line(self) -> &'static str {
        match self {
            Self::Intro => "Booting UI engine…",
            Self::Assembling => "Routing components into orbit…",
            Self::Final => "Locking layout and visuals…",
            Self::Exit | Self::Done => "Portfolio ready. Handing over control.",
        }
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Assembling => "assembling",
            Self::Final => "final",
            Self::Exit => "exit",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected phase change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The target is not the immediate successor of the current phase
    #[error("cannot move from {from} to {to}: phases advance one step at a time")]
    OutOfOrder {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },

    /// The sequencer already reached `Done`
    #[error("phase sequence already finished")]
    AlreadyDone,
}

/// Absolute mount-relative offsets of the later phases
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    /// Enter [`Phase::Assembling`]
    pub assembling: Duration,
    /// Enter [`Phase::Final`]
    pub final_: Duration,
    /// Enter [`Phase::Exit`]
    pub exit: Duration,
    /// Enter [`Phase::Done`] and notify the host
    pub done: Duration,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            assembling: Duration::from_millis(800),
            final_: Duration::from_millis(4600),
            exit: Duration::from_millis(6500),
            done: Duration::from_millis(7200),
        }
    }
}

impl PhaseSchedule {
    /// Offset at which `phase` is entered (`Intro` is entered at mount)
    #[must_use]
    pub fn offset(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Intro => Duration::ZERO,
            Phase::Assembling => self.assembling,
            Phase::Final => self.final_,
            Phase::Exit => self.exit,
            Phase::Done => self.done,
        }
    }

    /// First offset that comes before its predecessor's, if any
    #[must_use]
    pub fn first_out_of_order(&self) -> Option<(Phase, Duration, Duration)> {
        Phase::ALL.windows(2).find_map(|pair| {
            let (previous, phase) = (pair[0], pair[1]);
            let (before, at) = (self.offset(previous), self.offset(phase));
            (at < before).then_some((phase, at, before))
        })
    }
}

/// Forward-only phase state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSequencer {
    current: Phase,
    visited: Vec<Phase>,
}

impl Default for PhaseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseSequencer {
    /// Start in [`Phase::Intro`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Phase::Intro,
            visited: vec![Phase::Intro],
        }
    }

    /// Current phase
    #[must_use]
    pub fn current(&self) -> Phase {
        self.current
    }

    /// Phases entered so far, in order
    #[must_use]
    pub fn visited(&self) -> &[Phase] {
        &self.visited
    }

    /// Whether `Done` was reached
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.current.is_terminal()
    }

    /// Enter `to`, which must be the immediate successor
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] and leaves the phase unchanged if `to`
    /// would skip or revisit a phase.
    pub fn enter(&mut self, to: Phase) -> Result<(), TransitionError> {
        match self.current.next() {
            None => Err(TransitionError::AlreadyDone),
            Some(next) if next == to => {
                self.current = to;
                self.visited.push(to);
                Ok(())
            }
            Some(_) => Err(TransitionError::OutOfOrder {
                from: self.current,
                to,
            }),
        }
    }

    /// Step forward through every remaining phase up to `Done`
    ///
    /// Returns the phases entered, which is empty if already done.
    pub fn finish(&mut self) -> Vec<Phase> {
        let mut entered = Vec::new();
        while let Some(next) = self.current.next() {
            self.current = next;
            self.visited.push(next);
            entered.push(next);
        }
        entered
    }
}
