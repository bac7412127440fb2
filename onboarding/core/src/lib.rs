//! Onboarding Core - Staged onboarding sequencer for the portfolio intro
//!
//! This crate holds the timing engine behind the portfolio's first-visit
//! experience: a typewriter landing transcript followed by an "assembly"
//! sequence in which UI elements fly in, a build percentage climbs, and a
//! single completion notification hands control back to the host. It is
//! independent of any renderer; the host binary prints snapshots, a web or
//! terminal frontend could draw them.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Host                                  │
//! │   spawn_timeline(OnboardingFlow) ──▶ TimelineHandle            │
//! │        ▲ watch<FlowSnapshot>             │ command(proceed)    │
//! └────────┼─────────────────────────────────┼─────────────────────┘
//!          │                                 ▼
//! ┌────────┴───────────────────────────────────────────────────────┐
//! │                     ONBOARDING CORE                            │
//! │  ┌──────────────────────────────────────────────────────────┐  │
//! │  │                   OnboardingFlow                         │  │
//! │  │  Landing ─────────▶ Assembling ─────────▶ Main           │  │
//! │  │  ┌────────────────┐ ┌──────────────────────────────────┐ │  │
//! │  │  │  Typewriter    │ │ AssemblySequencer                │ │  │
//! │  │  │  Automaton     │ │  Phases · Elements · Progress    │ │  │
//! │  │  │                │ │  CompletionGate                  │ │  │
//! │  │  └───────┬────────┘ └───────────────┬──────────────────┘ │  │
//! │  │          └──────── TimerRegistry ───┘                    │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every timed component keeps its own [`TimerRegistry`] on a virtual,
//! mount-relative clock and implements [`Timeline`]. Tests drive timelines
//! directly with [`Timeline::advance_to`]; the [`driver`] runs them in real
//! time on tokio.
//!
//! # Key Types
//!
//! - [`TypewriterAutomaton`]: Character-by-character landing transcript
//! - [`AssemblySequencer`]: Phases, element reveals, progress and completion
//! - [`OnboardingFlow`]: Screen routing between landing, assembly and main
//! - [`MountSlot`]: Tears an instance down before mounting its replacement
//! - [`OnboardingConfig`]: Layered TOML / environment / CLI configuration
//!
//! # Quick Start
//!
//! ```ignore
//! use onboarding_core::{spawn_timeline, load_config, OnboardingFlow, Screen};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let flow = OnboardingFlow::new(load_config()?)?;
//!     let handle = spawn_timeline(flow);
//!     let mut snapshots = handle.subscribe();
//!
//!     snapshots.wait_for(|s| s.landing.as_ref().is_some_and(|l| l.ready)).await?;
//!     handle.command(|flow| flow.proceed()).await??;
//!     snapshots.wait_for(|s| s.screen == Screen::Main).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`timer`]: Ordered, cancellable one-shot timers on a virtual clock
//! - [`lifecycle`]: The [`Timeline`] trait, instance ids and mount slots
//! - [`script`]: Landing transcript lines
//! - [`typewriter`]: Typewriter state machine and pacing
//! - [`phase`]: Assembly phases and their schedule
//! - [`elements`]: Element specs and readiness tracking
//! - [`progress`]: Time-derived build percentage
//! - [`gate`]: At-most-once completion callback
//! - [`sequencer`]: The assembly sequence tying the above together
//! - [`flow`]: Landing → assembly → main routing
//! - [`presentation`]: Renderer hints derived from snapshots
//! - [`driver`]: Real-time tokio driver
//! - [`config`]: Configuration loading
//!
//! # No Renderer Dependencies
//!
//! This crate never prints and never installs a tracing subscriber. It emits
//! `tracing` events and leaves output to the host.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod driver;
pub mod elements;
pub mod flow;
pub mod gate;
pub mod lifecycle;
pub mod phase;
pub mod presentation;
pub mod progress;
pub mod script;
pub mod sequencer;
pub mod timer;
pub mod typewriter;

// Re-exports for convenience
pub use driver::{spawn_timeline, DriverError, TimelineHandle};
pub use elements::{AssemblyElement, ElementError, ElementRevealTracker, ElementSpec};
pub use flow::{FlowError, FlowSnapshot, OnboardingFlow, Screen};
pub use gate::CompletionGate;
pub use lifecycle::{run_to_quiescence, InstanceId, MountSlot, Timeline};
pub use phase::{Phase, PhaseSchedule, PhaseSequencer, TransitionError};
pub use presentation::{overlay_visible, pill_label, AvatarStance, ElementMotion};
pub use progress::{ProgressConfig, ProgressInterpolator};
pub use script::{Line, Script};
pub use sequencer::{
    AssemblyConfig, AssemblySequencer, ElementSnapshot, SequencerError, SequencerSnapshot,
};
pub use timer::{TimerRegistry, TimerToken};
pub use typewriter::{
    LinePacing, TypewriterAutomaton, TypewriterPacing, TypewriterSnapshot, TypewriterState,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, LandingConfig, OnboardingConfig, OnboardingToml,
};
