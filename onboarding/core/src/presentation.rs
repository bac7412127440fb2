//! Presentation hints derived from snapshots
//!
//! Renderers ask these instead of matching on phases themselves. Nothing here
//! mutates sequencer state.

use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::sequencer::ElementSnapshot;

/// Where the flying elements should be drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMotion {
    /// Outside the frame, invisible
    Offscreen,
    /// Circling the avatar
    Orbit,
    /// Collapsing into the avatar
    Merge,
}

impl ElementMotion {
    /// Motion target for `phase`
    #[must_use]
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Intro => Self::Offscreen,
            Phase::Assembling => Self::Orbit,
            Phase::Final | Phase::Exit | Phase::Done => Self::Merge,
        }
    }
}

/// How the avatar should be animated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarStance {
    /// Scaling in
    Entering,
    /// Breathing glow
    Pulsing,
}

impl AvatarStance {
    /// Stance for `phase`
    #[must_use]
    pub fn for_phase(phase: Phase) -> Self {
        if phase == Phase::Intro {
            Self::Entering
        } else {
            Self::Pulsing
        }
    }
}

/// Status pill text, e.g. `HTML · ready`
#[must_use]
pub fn pill_label(element: &ElementSnapshot) -> String {
    let state = if element.ready { "ready" } else { "loading" };
    format!("{} · {state}", element.label)
}

/// Whether the assembly overlay is still on screen
#[must_use]
pub fn overlay_visible(phase: Phase) -> bool {
    phase < Phase::Done
}
