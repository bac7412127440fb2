//! Assembly Sequencer
//!
//! Composes the phase machine, the element tracker, the progress sampler and
//! the completion gate over one [`TimerRegistry`]. Mounting arms everything at
//! once against absolute offsets:
//!
//! ```text
//! 0ms      800ms        1200ms … 4200ms          4600ms   6200ms   6500ms   7200ms
//! Intro ─▶ Assembling                           Final                Exit ─▶ Done + notify
//!          elements:    html   …  deploy
//! progress: every 100ms ─────────────────────────────────▶ 100%
//! ```
//!
//! The three timelines share nothing but the registry; progress is not
//! derived from phases and phases are not chained from one another.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::{ElementError, ElementRevealTracker, ElementSpec};
use crate::gate::CompletionGate;
use crate::lifecycle::{InstanceId, Timeline};
use crate::phase::{Phase, PhaseSchedule, PhaseSequencer};
use crate::progress::{ProgressConfig, ProgressInterpolator};
use crate::timer::TimerRegistry;
use crate::typewriter::duration_ms;

/// Rejected assembly configuration
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// Element list is invalid
    #[error(transparent)]
    Elements(#[from] ElementError),

    /// A phase offset precedes the previous phase's offset
    #[error("{phase} offset {at:?} comes before the previous phase at {previous:?}")]
    PhasesOutOfOrder {
        /// Offending phase
        phase: Phase,
        /// Its offset
        at: Duration,
        /// Offset of the phase before it
        previous: Duration,
    },

    /// Progress would never advance
    #[error("progress total duration must be greater than zero")]
    ZeroProgressDuration,

    /// Progress would sample in a busy loop
    #[error("progress sample interval must be greater than zero")]
    ZeroSampleInterval,
}

/// Everything the assembly sequence needs at mount
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Phase offsets
    pub phases: PhaseSchedule,
    /// Elements in display order
    pub elements: Vec<ElementSpec>,
    /// Progress timing
    pub progress: ProgressConfig,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            phases: PhaseSchedule::default(),
            elements: ElementSpec::defaults(),
            progress: ProgressConfig::default(),
        }
    }
}

impl AssemblyConfig {
    /// Check the configuration can be mounted
    ///
    /// # Errors
    ///
    /// Returns the first [`SequencerError`] found.
    pub fn validate(&self) -> Result<(), SequencerError> {
        if let Some((phase, at, previous)) = self.phases.first_out_of_order() {
            return Err(SequencerError::PhasesOutOfOrder {
                phase,
                at,
                previous,
            });
        }
        if self.progress.total_duration.is_zero() {
            return Err(SequencerError::ZeroProgressDuration);
        }
        if self.progress.sample_interval.is_zero() {
            return Err(SequencerError::ZeroSampleInterval);
        }
        crate::elements::validate_specs(&self.elements)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SequencerEvent {
    EnterPhase(Phase),
    ElementReady(usize),
    ProgressSample(u32),
    Complete,
}

/// One element as seen by a renderer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Stable identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Whether the element has been revealed
    pub ready: bool,
}

/// Renderer view of the assembly sequence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    /// Owning instance
    pub instance: InstanceId,
    /// Mount-relative time in milliseconds
    pub elapsed_ms: u64,
    /// Current phase
    pub phase: Phase,
    /// Build progress, 0..=100
    pub percent: u8,
    /// Elements revealed so far
    pub ready_count: usize,
    /// Elements in total
    pub element_count: usize,
    /// Per-element state in display order
    pub elements: Vec<ElementSnapshot>,
    /// Host has been notified
    pub complete: bool,
}

/// The mounted assembly sequence
#[derive(Debug)]
pub struct AssemblySequencer {
    id: InstanceId,
    phases: PhaseSequencer,
    tracker: ElementRevealTracker,
    progress: ProgressInterpolator,
    gate: CompletionGate,
    timers: TimerRegistry<SequencerEvent>,
}

impl AssemblySequencer {
    /// Validate `config`, arm every timer and hold `on_complete`
    ///
    /// `on_complete` is called exactly once, when `Done` is entered, unless
    /// the sequencer is torn down first.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the configuration is invalid; nothing is
    /// armed in that case.
    pub fn mount<F>(config: AssemblyConfig, on_complete: F) -> Result<Self, SequencerError>
    where
        F: FnOnce() + Send + 'static,
    {
        config.validate()?;

        let AssemblyConfig {
            phases: schedule,
            elements,
            progress,
        } = config;

        let mut sequencer = Self {
            id: InstanceId::new(),
            phases: PhaseSequencer::new(),
            tracker: ElementRevealTracker::new(elements)?,
            progress: ProgressInterpolator::new(progress),
            gate: CompletionGate::new(on_complete),
            timers: TimerRegistry::new(),
        };
        sequencer.arm(&schedule);

        tracing::info!(
            instance = %sequencer.id,
            elements = sequencer.tracker.len(),
            done_at_ms = duration_ms(schedule.done),
            "Assembly sequencer mounted"
        );
        Ok(sequencer)
    }

    fn arm(&mut self, schedule: &PhaseSchedule) {
        for phase in [Phase::Assembling, Phase::Final, Phase::Exit] {
            self.timers
                .schedule_at(SequencerEvent::EnterPhase(phase), schedule.offset(phase));
        }
        // The only place completion is ever scheduled.
        self.timers
            .schedule_at(SequencerEvent::Complete, schedule.done);

        for (index, element) in self.tracker.elements().iter().enumerate() {
            self.timers.schedule_at(
                SequencerEvent::ElementReady(index),
                element.scheduled_offset(),
            );
        }

        if let Some(first_sample) = self.progress.sample_instant(1) {
            self.timers
                .schedule_at(SequencerEvent::ProgressSample(1), first_sample);
        }
    }

    fn handle(&mut self, event: SequencerEvent, due: Duration) {
        match event {
            SequencerEvent::EnterPhase(phase) => match self.phases.enter(phase) {
                Ok(()) => {
                    tracing::debug!(instance = %self.id, %phase, at_ms = duration_ms(due), "Phase entered");
                }
                Err(error) => {
                    tracing::warn!(instance = %self.id, %phase, %error, "Phase transition rejected");
                }
            },
            SequencerEvent::Complete => {
                let entered = self.phases.finish();
                if entered.len() > 1 {
                    tracing::warn!(
                        instance = %self.id,
                        ?entered,
                        "Completion reached before intermediate phases; stepped through them"
                    );
                }
                if self.gate.fire() {
                    tracing::info!(instance = %self.id, at_ms = duration_ms(due), "Assembly complete, host notified");
                }
            }
            SequencerEvent::ElementReady(index) => {
                if self.tracker.mark_ready(index) {
                    tracing::debug!(
                        instance = %self.id,
                        element = self.tracker.elements()[index].id(),
                        ready = self.tracker.ready_count(),
                        "Element ready"
                    );
                }
            }
            SequencerEvent::ProgressSample(n) => {
                let percent = self.progress.sample(due);
                if percent >= 100 {
                    tracing::debug!(instance = %self.id, at_ms = duration_ms(due), "Progress reached 100%");
                    return;
                }
                let next = n.checked_add(1).and_then(|next| {
                    self.progress.sample_instant(next).map(|at| (next, at))
                });
                match next {
                    Some((next, at)) => {
                        self.timers
                            .schedule_at(SequencerEvent::ProgressSample(next), at);
                    }
                    None => {
                        tracing::warn!(instance = %self.id, samples = n, %percent, "Progress sample grid exhausted; sampling stopped");
                    }
                }
            }
        }
    }

    /// Instance identifier
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phases.current()
    }

    /// Phases entered so far
    #[must_use]
    pub fn visited_phases(&self) -> &[Phase] {
        self.phases.visited()
    }

    /// Latest progress percentage
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.progress.percent()
    }

    /// Element readiness
    #[must_use]
    pub fn elements(&self) -> &ElementRevealTracker {
        &self.tracker
    }

    /// Elements revealed so far
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.tracker.ready_count()
    }

    /// Whether the host has been notified
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.gate.has_fired()
    }

    /// Mount-relative time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timers.now()
    }

    /// Number of timers still armed
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Timeline for AssemblySequencer {
    type Snapshot = SequencerSnapshot;

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    fn advance_to(&mut self, now: Duration) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.handle(fired.event, fired.deadline);
        }
        self.timers.settle(now);
    }

    fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            instance: self.id,
            elapsed_ms: duration_ms(self.timers.now()),
            phase: self.phases.current(),
            percent: self.progress.percent(),
            ready_count: self.tracker.ready_count(),
            element_count: self.tracker.len(),
            elements: self
                .tracker
                .elements()
                .iter()
                .map(|element| ElementSnapshot {
                    id: element.id().to_owned(),
                    label: element.label().to_owned(),
                    ready: element.is_ready(),
                })
                .collect(),
            complete: self.gate.has_fired(),
        }
    }

    fn teardown(&mut self) {
        let cancelled = self.timers.cancel_all();
        let discarded = self.gate.disarm();
        if cancelled > 0 || discarded {
            tracing::info!(
                instance = %self.id,
                cancelled,
                phase = %self.phases.current(),
                "Assembly sequencer torn down"
            );
        }
    }
}

impl Drop for AssemblySequencer {
    fn drop(&mut self) {
        self.teardown();
    }
}
