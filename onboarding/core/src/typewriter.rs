//! Typewriter Landing
//!
//! Reveals a [`Script`] one character per step, the way a terminal session
//! would print it. Pacing depends on the line kind: command lines wait longer
//! before the first character, like someone typing at a prompt.
//!
//! # Timing
//!
//! A line costs `line_start + chars × per_char`:
//!
//! ```text
//! mount ──line_start──▶ c1 ─per_char─▶ c2 … cN ─per_char─▶ line done ──line_start──▶ …
//! ```
//!
//! An empty line completes on the step that starts it, so it still costs its
//! line-start pause. Exactly one step is ever pending.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::{InstanceId, Timeline};
use crate::script::{Line, Script};
use crate::timer::TimerRegistry;

/// Delays for one kind of line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinePacing {
    /// Pause before the line's first step
    pub line_start: Duration,
    /// Pause between character steps
    pub per_char: Duration,
}

impl LinePacing {
    /// Pacing from millisecond values
    #[must_use]
    pub const fn from_millis(line_start: u64, per_char: u64) -> Self {
        Self {
            line_start: Duration::from_millis(line_start),
            per_char: Duration::from_millis(per_char),
        }
    }
}

/// Pacing for command and output lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypewriterPacing {
    /// Lines starting with `$`
    pub command: LinePacing,
    /// Everything else
    pub output: LinePacing,
}

impl Default for TypewriterPacing {
    fn default() -> Self {
        Self {
            command: LinePacing::from_millis(500, 40),
            output: LinePacing::from_millis(300, 40),
        }
    }
}

impl TypewriterPacing {
    /// Effective pacing for `line`, honoring its per-character override
    #[must_use]
    pub fn for_line(&self, line: &Line) -> LinePacing {
        let base = if line.is_command() {
            self.command
        } else {
            self.output
        };
        LinePacing {
            per_char: line.char_delay_override().unwrap_or(base.per_char),
            ..base
        }
    }

    /// Time from mount until `script` is fully typed
    #[must_use]
    pub fn transcript_duration(&self, script: &Script) -> Duration {
        script
            .lines()
            .iter()
            .map(|line| {
                let pacing = self.for_line(line);
                let chars = u32::try_from(line.char_count()).unwrap_or(u32::MAX);
                pacing.line_start + pacing.per_char * chars
            })
            .sum()
    }
}

/// What a single [`TypewriterState::step`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// One more character of the current line became visible
    Revealed,
    /// The current line was completed and the next one is current
    LineCompleted,
    /// The last line was completed
    Finished,
    /// Already done; nothing changed
    Idle,
}

/// Pure reveal state for a script
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypewriterState {
    current_line_index: usize,
    chars_revealed_in_line: usize,
    lines_completed: Vec<String>,
    done: bool,
}

impl TypewriterState {
    /// Fresh state; an empty script is done immediately
    #[must_use]
    pub fn initialize(script: &Script) -> Self {
        Self {
            current_line_index: 0,
            chars_revealed_in_line: 0,
            lines_completed: Vec::with_capacity(script.len()),
            done: script.is_empty(),
        }
    }

    /// Reveal one character or complete the current line
    pub fn step(&mut self, script: &Script) -> StepOutcome {
        if self.done {
            return StepOutcome::Idle;
        }
        let Some(line) = script.get(self.current_line_index) else {
            self.done = true;
            return StepOutcome::Finished;
        };

        if self.chars_revealed_in_line < line.char_count() {
            self.chars_revealed_in_line += 1;
            return StepOutcome::Revealed;
        }

        self.lines_completed.push(line.text().to_owned());
        self.chars_revealed_in_line = 0;
        self.current_line_index += 1;

        if self.current_line_index == script.len() {
            self.done = true;
            StepOutcome::Finished
        } else {
            StepOutcome::LineCompleted
        }
    }

    /// Index of the line being typed
    #[must_use]
    pub fn current_line_index(&self) -> usize {
        self.current_line_index
    }

    /// Characters of the current line already visible
    #[must_use]
    pub fn chars_revealed_in_line(&self) -> usize {
        self.chars_revealed_in_line
    }

    /// Fully typed lines, in order
    #[must_use]
    pub fn lines_completed(&self) -> &[String] {
        &self.lines_completed
    }

    /// Whether every line has been typed
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// The partially typed line shown under the cursor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialLine {
    /// Visible prefix
    pub text: String,
    /// Whether the line is a command
    pub is_command: bool,
}

/// Renderer view of the typewriter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypewriterSnapshot {
    /// Owning instance
    pub instance: InstanceId,
    /// Mount-relative time in milliseconds
    pub elapsed_ms: u64,
    /// Fully typed lines
    pub completed_lines: Vec<String>,
    /// Line currently being typed
    pub current_line: Option<PartialLine>,
    /// Transcript finished; the host may offer its proceed action
    pub ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step;

/// Self-scheduling typewriter over a script
#[derive(Debug)]
pub struct TypewriterAutomaton {
    id: InstanceId,
    script: Script,
    pacing: TypewriterPacing,
    state: TypewriterState,
    timers: TimerRegistry<Step>,
}

impl TypewriterAutomaton {
    /// Mount a typewriter and arm its first step
    #[must_use]
    pub fn mount(script: Script, pacing: TypewriterPacing) -> Self {
        let state = TypewriterState::initialize(&script);
        let mut automaton = Self {
            id: InstanceId::new(),
            script,
            pacing,
            state,
            timers: TimerRegistry::new(),
        };

        if let Some(first) = automaton.script.get(0) {
            let delay = automaton.pacing.for_line(first).line_start;
            automaton.timers.schedule(Step, delay);
        }

        tracing::debug!(
            instance = %automaton.id,
            lines = automaton.script.len(),
            ready = automaton.state.is_done(),
            "Typewriter mounted"
        );
        automaton
    }

    fn on_step(&mut self) {
        match self.state.step(&self.script) {
            StepOutcome::Revealed => {
                if let Some(line) = self.script.get(self.state.current_line_index()) {
                    self.timers.schedule(Step, self.pacing.for_line(line).per_char);
                }
            }
            StepOutcome::LineCompleted => {
                if let Some(line) = self.script.get(self.state.current_line_index()) {
                    self.timers
                        .schedule(Step, self.pacing.for_line(line).line_start);
                }
            }
            StepOutcome::Finished => {
                tracing::info!(
                    instance = %self.id,
                    elapsed_ms = duration_ms(self.timers.now()),
                    "Landing transcript complete"
                );
            }
            StepOutcome::Idle => {}
        }
    }

    /// Instance identifier
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Reveal state
    #[must_use]
    pub fn state(&self) -> &TypewriterState {
        &self.state
    }

    /// The script being typed
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Transcript finished; no further automatic changes happen
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_done()
    }

    /// Mount-relative time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timers.now()
    }
}

impl Timeline for TypewriterAutomaton {
    type Snapshot = TypewriterSnapshot;

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    fn advance_to(&mut self, now: Duration) {
        while self.timers.pop_due(now).is_some() {
            self.on_step();
        }
        self.timers.settle(now);
    }

    fn snapshot(&self) -> TypewriterSnapshot {
        let current_line = if self.state.is_done() {
            None
        } else {
            self.script
                .get(self.state.current_line_index())
                .map(|line| PartialLine {
                    text: line.prefix(self.state.chars_revealed_in_line()).to_owned(),
                    is_command: line.is_command(),
                })
        };

        TypewriterSnapshot {
            instance: self.id,
            elapsed_ms: duration_ms(self.timers.now()),
            completed_lines: self.state.lines_completed().to_vec(),
            current_line,
            ready: self.state.is_done(),
        }
    }

    fn teardown(&mut self) {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            tracing::debug!(instance = %self.id, cancelled, "Typewriter torn down");
        }
    }
}

impl Drop for TypewriterAutomaton {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
