//! Onboarding Flow
//!
//! Screen routing around the two timelines:
//!
//! ```text
//! Landing ──proceed()──▶ Assembling ──completion──▶ Main
//!    ▲                                                │
//!    └──────────────return_to_landing()───────────────┘
//! ```
//!
//! The flow keeps one clock for the whole session. Each screen's instance is
//! mounted at some flow instant and sees time relative to that instant, so a
//! sequencer mounted at 3.2s still reaches `Done` 7.2s after its own mount.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LandingConfig, OnboardingConfig};
use crate::lifecycle::{MountSlot, Timeline};
use crate::sequencer::{AssemblyConfig, AssemblySequencer, SequencerError, SequencerSnapshot};
use crate::typewriter::{duration_ms, TypewriterAutomaton, TypewriterSnapshot};

/// Which screen the flow is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Typewriter landing
    Landing,
    /// Assembly sequence
    Assembling,
    /// The page proper
    Main,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Landing => "landing",
            Self::Assembling => "assembling",
            Self::Main => "main",
        };
        f.write_str(name)
    }
}

/// Rejected flow action
#[derive(Debug, Error)]
pub enum FlowError {
    /// Proceed was requested before the transcript finished
    #[error("landing transcript is still typing")]
    LandingNotReady,

    /// The action is not available on the current screen
    #[error("cannot {action} from the {screen} screen")]
    WrongScreen {
        /// Requested action
        action: &'static str,
        /// Screen at the time of the request
        screen: Screen,
    },

    /// The assembly sequencer could not be mounted
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// Renderer view of the whole flow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    /// Current screen
    pub screen: Screen,
    /// Flow time in milliseconds
    pub elapsed_ms: u64,
    /// Landing state while on the landing screen
    pub landing: Option<TypewriterSnapshot>,
    /// Assembly state while assembling; on the main screen, the state the
    /// finished run ended in
    pub assembly: Option<SequencerSnapshot>,
    /// How many assembly runs have handed over to the main screen
    pub completed_runs: u32,
}

/// Session-level owner of the landing and assembly timelines
#[derive(Debug)]
pub struct OnboardingFlow {
    landing_config: LandingConfig,
    assembly_config: AssemblyConfig,
    screen: Screen,
    now: Duration,
    mounted_at: Duration,
    landing: MountSlot<TypewriterAutomaton>,
    assembly: MountSlot<AssemblySequencer>,
    finished_assembly: Option<SequencerSnapshot>,
    completed: Arc<AtomicBool>,
    completed_runs: u32,
}

impl OnboardingFlow {
    fn unmounted(config: OnboardingConfig) -> Result<Self, FlowError> {
        config.assembly.validate()?;
        Ok(Self {
            landing_config: config.landing,
            assembly_config: config.assembly,
            screen: Screen::Landing,
            now: Duration::ZERO,
            mounted_at: Duration::ZERO,
            landing: MountSlot::new(),
            assembly: MountSlot::new(),
            finished_assembly: None,
            completed: Arc::new(AtomicBool::new(false)),
            completed_runs: 0,
        })
    }

    /// Start on the landing screen
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Sequencer`] if the assembly configuration is
    /// invalid, so a bad config is caught before the landing is shown.
    pub fn new(config: OnboardingConfig) -> Result<Self, FlowError> {
        let mut flow = Self::unmounted(config)?;
        flow.mount_landing();
        Ok(flow)
    }

    /// Skip the landing and mount the assembly sequence immediately
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Sequencer`] if the assembly configuration is
    /// invalid.
    pub fn starting_at_assembly(config: OnboardingConfig) -> Result<Self, FlowError> {
        let mut flow = Self::unmounted(config)?;
        flow.mount_assembly()?;
        Ok(flow)
    }

    fn mount_landing(&mut self) {
        let LandingConfig { script, pacing } = self.landing_config.clone();
        self.landing
            .remount(|| TypewriterAutomaton::mount(script, pacing));
        self.finished_assembly = None;
        self.mounted_at = self.now;
        self.screen = Screen::Landing;
    }

    fn mount_assembly(&mut self) -> Result<(), FlowError> {
        self.completed.store(false, Ordering::SeqCst);
        let signal = Arc::clone(&self.completed);
        let config = self.assembly_config.clone();
        self.assembly.try_remount(|| {
            AssemblySequencer::mount(config, move || signal.store(true, Ordering::SeqCst))
        })?;
        self.mounted_at = self.now;
        self.screen = Screen::Assembling;
        Ok(())
    }

    /// Leave the finished landing for the assembly sequence
    ///
    /// # Errors
    ///
    /// - [`FlowError::WrongScreen`] unless on the landing screen
    /// - [`FlowError::LandingNotReady`] while the transcript is still typing
    pub fn proceed(&mut self) -> Result<(), FlowError> {
        if self.screen != Screen::Landing {
            return Err(FlowError::WrongScreen {
                action: "proceed",
                screen: self.screen,
            });
        }
        if !self.landing.get().is_some_and(TypewriterAutomaton::is_ready) {
            return Err(FlowError::LandingNotReady);
        }

        // A rejected config must leave the landing mounted
        self.assembly_config.validate()?;
        self.landing.unmount();
        self.mount_assembly()?;
        tracing::info!(at_ms = duration_ms(self.now), "Proceeding to assembly");
        Ok(())
    }

    /// Go back from the main screen to a freshly mounted landing
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongScreen`] unless on the main screen.
    pub fn return_to_landing(&mut self) -> Result<(), FlowError> {
        if self.screen != Screen::Main {
            return Err(FlowError::WrongScreen {
                action: "return to landing",
                screen: self.screen,
            });
        }
        self.mount_landing();
        tracing::info!(at_ms = duration_ms(self.now), "Returned to landing");
        Ok(())
    }

    /// Current screen
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Flow time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.now
    }

    /// Mounted landing typewriter
    #[must_use]
    pub fn landing(&self) -> Option<&TypewriterAutomaton> {
        self.landing.get()
    }

    /// Mounted assembly sequencer
    #[must_use]
    pub fn assembly(&self) -> Option<&AssemblySequencer> {
        self.assembly.get()
    }

    /// Assembly runs that reached the main screen
    #[must_use]
    pub fn completed_runs(&self) -> u32 {
        self.completed_runs
    }

    fn local(&self, now: Duration) -> Duration {
        now.saturating_sub(self.mounted_at)
    }
}

impl Timeline for OnboardingFlow {
    type Snapshot = FlowSnapshot;

    fn next_deadline(&self) -> Option<Duration> {
        let local = match self.screen {
            Screen::Landing => self.landing.get().and_then(Timeline::next_deadline),
            Screen::Assembling => self.assembly.get().and_then(Timeline::next_deadline),
            Screen::Main => None,
        };
        local.map(|deadline| self.mounted_at + deadline)
    }

    fn advance_to(&mut self, now: Duration) {
        if now < self.now {
            return;
        }
        self.now = now;
        let local = self.local(now);

        match self.screen {
            Screen::Landing => {
                if let Some(landing) = self.landing.get_mut() {
                    landing.advance_to(local);
                }
            }
            Screen::Assembling => {
                if let Some(assembly) = self.assembly.get_mut() {
                    assembly.advance_to(local);
                }
                if self.completed.swap(false, Ordering::SeqCst) {
                    self.finished_assembly = self.assembly.get().map(Timeline::snapshot);
                    self.assembly.unmount();
                    self.screen = Screen::Main;
                    self.completed_runs += 1;
                    tracing::info!(
                        at_ms = duration_ms(now),
                        runs = self.completed_runs,
                        "Assembly complete, showing main screen"
                    );
                }
            }
            Screen::Main => {}
        }
    }

    fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            screen: self.screen,
            elapsed_ms: duration_ms(self.now),
            landing: self.landing.get().map(Timeline::snapshot),
            assembly: match self.screen {
                Screen::Main => self.finished_assembly.clone(),
                _ => self.assembly.get().map(Timeline::snapshot),
            },
            completed_runs: self.completed_runs,
        }
    }

    fn teardown(&mut self) {
        self.landing.unmount();
        self.assembly.unmount();
    }
}
