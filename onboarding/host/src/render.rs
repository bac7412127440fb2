//! Snapshot rendering for the terminal
//!
//! Turns the stream of [`FlowSnapshot`]s into output lines. Text mode prints
//! only what changed since the previous snapshot; JSON mode prints one object
//! per distinct snapshot.

use onboarding_core::{
    overlay_visible, pill_label, AvatarStance, ElementMotion, FlowSnapshot, Screen,
    SequencerSnapshot, TypewriterSnapshot,
};

/// Progress is reported in steps of this many percent
const PROGRESS_STEP: u8 = 10;

/// Output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Human-readable diff lines
    Text,
    /// One JSON object per snapshot
    Json,
}

/// Stateful renderer remembering the last snapshot it saw
#[derive(Debug)]
pub struct Renderer {
    format: Format,
    auto_proceed: bool,
    last: Option<FlowSnapshot>,
}

impl Renderer {
    pub fn new(format: Format, auto_proceed: bool) -> Self {
        Self {
            format,
            auto_proceed,
            last: None,
        }
    }

    /// Lines to print for `snapshot`
    pub fn render(&mut self, snapshot: &FlowSnapshot) -> Vec<String> {
        if self.last.as_ref() == Some(snapshot) {
            return Vec::new();
        }

        let lines = match self.format {
            Format::Json => serde_json::to_string(snapshot).map_or_else(
                |e| {
                    tracing::warn!(error = %e, "Failed to serialize snapshot");
                    Vec::new()
                },
                |json| vec![json],
            ),
            Format::Text => self.render_text(snapshot),
        };

        self.last = Some(snapshot.clone());
        lines
    }

    fn render_text(&self, snapshot: &FlowSnapshot) -> Vec<String> {
        let previous = self.last.as_ref();
        let mut out = Vec::new();

        // The finished run closes out before the main screen header
        if snapshot.screen == Screen::Main {
            if let Some(assembly) = &snapshot.assembly {
                let before = previous.and_then(|p| p.assembly.as_ref());
                assembly_lines(before, assembly, &mut out);
            }
        }

        if previous.map(|p| p.screen) != Some(snapshot.screen) {
            out.push(format!("== {} ==", snapshot.screen));
        }

        match snapshot.screen {
            Screen::Landing => {
                if let Some(landing) = &snapshot.landing {
                    let before = previous.and_then(|p| p.landing.as_ref());
                    self.landing_lines(before, landing, &mut out);
                }
            }
            Screen::Assembling => {
                if let Some(assembly) = &snapshot.assembly {
                    let before = previous.and_then(|p| p.assembly.as_ref());
                    assembly_lines(before, assembly, &mut out);
                }
            }
            Screen::Main => {
                if previous.map(|p| p.screen) != Some(Screen::Main) {
                    out.push(format!(
                        "Portfolio ready at {}ms (run {}).",
                        snapshot.elapsed_ms, snapshot.completed_runs
                    ));
                }
            }
        }

        out
    }

    fn landing_lines(
        &self,
        before: Option<&TypewriterSnapshot>,
        landing: &TypewriterSnapshot,
        out: &mut Vec<String>,
    ) {
        let before = before.filter(|b| b.instance == landing.instance);
        let printed = before.map_or(0, |b| b.completed_lines.len());

        out.extend(landing.completed_lines.iter().skip(printed).cloned());

        if landing.ready && !before.is_some_and(|b| b.ready) && !self.auto_proceed {
            out.push("[press Enter to continue]".to_string());
        }
    }
}

fn assembly_lines(
    before: Option<&SequencerSnapshot>,
    assembly: &SequencerSnapshot,
    out: &mut Vec<String>,
) {
    let before = before.filter(|b| b.instance == assembly.instance);

    if before.map(|b| b.phase) != Some(assembly.phase) {
        out.push(format!(
            "[{}] {} (elements: {:?}, avatar: {:?}{})",
            assembly.phase,
            assembly.phase.status_line(),
            ElementMotion::for_phase(assembly.phase),
            AvatarStance::for_phase(assembly.phase),
            if overlay_visible(assembly.phase) {
                ""
            } else {
                ", overlay hidden"
            }
        ));
    }

    for (index, element) in assembly.elements.iter().enumerate() {
        let was_ready = before
            .and_then(|b| b.elements.get(index))
            .is_some_and(|e| e.ready);
        if element.ready && !was_ready {
            out.push(format!("  {}", pill_label(element)));
        }
    }

    let step_before = before.map_or(0, |b| b.percent / PROGRESS_STEP);
    let step_now = assembly.percent / PROGRESS_STEP;
    if step_now > step_before {
        out.push(format!("  build {}%", step_now * PROGRESS_STEP));
    }
}
