//! Landing Script
//!
//! The immutable transcript the typewriter reveals. Lines beginning with `$`
//! are commands (typed after a longer pause, like a prompt), everything else
//! is output.

use std::sync::Arc;
use std::time::Duration;

/// Prefix that marks a command line
pub const COMMAND_PREFIX: char = '$';

/// One line of the landing transcript
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    text: String,
    is_command: bool,
    char_delay: Option<Duration>,
}

impl Line {
    /// A command line (longer line-start pause)
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_command: true,
            char_delay: None,
        }
    }

    /// An output line
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_command: false,
            char_delay: None,
        }
    }

    /// Classify by the leading `$`
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with(COMMAND_PREFIX) {
            Self::command(text)
        } else {
            Self::output(text)
        }
    }

    /// Type this line at its own per-character pace
    #[must_use]
    pub fn with_char_delay(mut self, delay: Duration) -> Self {
        self.char_delay = Some(delay);
        self
    }

    /// Full text of the line
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this is a command line
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.is_command
    }

    /// Per-character pace overriding the line kind's default
    #[must_use]
    pub fn char_delay_override(&self) -> Option<Duration> {
        self.char_delay
    }

    /// Length in characters (not bytes)
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `chars` characters of the line
    #[must_use]
    pub fn prefix(&self, chars: usize) -> &str {
        match self.text.char_indices().nth(chars) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    /// Whether the line has no text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Immutable ordered sequence of lines
///
/// Cloning is cheap; remounted typewriters share the same lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    lines: Arc<[Line]>,
}

impl Script {
    /// Build a script from lines
    pub fn new(lines: impl IntoIterator<Item = Line>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }

    /// Build a script from raw texts, classifying each with [`Line::parse`]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Line::parse))
    }

    /// A script with no lines
    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// The portfolio landing transcript
    ///
    /// The closing `switch_mode` exchange types slightly slower.
    #[must_use]
    pub fn landing() -> Self {
        let switch_pace = Duration::from_millis(50);
        Self::new([
            Line::command("$ whoami"),
            Line::output("Nikhil Deshmukh"),
            Line::output(""),
            Line::command("$ role"),
            Line::output("Software Engineer (Full-Stack | Cloud | AI)"),
            Line::output(""),
            Line::command("$ solved"),
            Line::output("350+ DSA problems | 8+ Projects | 500+ Mentored"),
            Line::output(""),
            Line::command("$ experience"),
            Line::output("SDE Intern @ Trovex.ai | AI/ML | Full-Stack | Cloud"),
            Line::output(""),
            Line::command("$ switch_mode").with_char_delay(switch_pace),
            Line::output("Switching to UI mode...").with_char_delay(switch_pace),
        ])
    }

    /// Line at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// All lines in order
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Line texts in order
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(Line::text).collect()
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the script has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::landing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_commands() {
        assert!(Line::parse("$ whoami").is_command());
        assert!(!Line::parse("Nikhil").is_command());
        assert!(!Line::parse("").is_command());
    }

    #[test]
    fn test_char_count_is_unicode_aware() {
        let line = Line::output("héllo · ok");
        assert_eq!(line.char_count(), 10);
        assert_eq!(line.prefix(2), "hé");
        assert_eq!(line.prefix(99), "héllo · ok");
        assert_eq!(line.prefix(0), "");
    }

    #[test]
    fn test_landing_script_shape() {
        let script = Script::landing();
        assert_eq!(script.len(), 14);
        assert_eq!(script.get(0).map(Line::text), Some("$ whoami"));
        assert!(script.lines().iter().filter(|l| l.is_empty()).count() >= 4);
        assert_eq!(
            script.get(13).and_then(Line::char_delay_override),
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn test_from_texts_round_trips_texts() {
        let script = Script::from_texts(["$ whoami", "Nikhil", ""]);
        assert_eq!(script.texts(), vec!["$ whoami", "Nikhil", ""]);
        assert!(Script::empty().is_empty());
    }
}
