//! TOML Configuration File Support
//!
//! Every timing constant of the onboarding sequence is configuration. Values
//! are layered with the following priority (highest first):
//!
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! The file lives at `$XDG_CONFIG_HOME/onboarding/onboarding.toml`
//! (typically `~/.config/onboarding/onboarding.toml`). A missing file is not
//! an error.
//!
//! # Example Configuration
//!
//! ```toml
//! [landing]
//! command_line_start_ms = 500
//! command_char_ms = 40
//! output_line_start_ms = 300
//! output_char_ms = 40
//! lines = ["$ whoami", "Nikhil", "", "$ role", "Engineer"]
//!
//! [phases]
//! assembling_ms = 800
//! final_ms = 4600
//! exit_ms = 6500
//! done_ms = 7200
//!
//! [progress]
//! total_ms = 6200
//! sample_interval_ms = 100
//!
//! [assembly]
//! element_base_ms = 1200
//! element_stride_ms = 600
//!
//! [[assembly.elements]]
//! id = "html"
//! label = "HTML"
//!
//! [[assembly.elements]]
//! id = "deploy"
//! label = "Deploy"
//! offset_ms = 2000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::{stagger_offset, ElementSpec, DEFAULT_ELEMENT_BASE, DEFAULT_ELEMENT_STRIDE};
use crate::script::Script;
use crate::sequencer::AssemblyConfig;
use crate::typewriter::TypewriterPacing;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Landing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingToml {
    /// Pause before a command line, in milliseconds
    pub command_line_start_ms: Option<u64>,

    /// Per-character pace of command lines, in milliseconds
    pub command_char_ms: Option<u64>,

    /// Pause before an output line, in milliseconds
    pub output_line_start_ms: Option<u64>,

    /// Per-character pace of output lines, in milliseconds
    pub output_char_ms: Option<u64>,

    /// Transcript lines; a leading `$` marks a command
    pub lines: Option<Vec<String>>,
}

/// Phases section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasesToml {
    /// Offset of the assembling phase
    pub assembling_ms: Option<u64>,

    /// Offset of the final phase
    pub final_ms: Option<u64>,

    /// Offset of the exit phase
    pub exit_ms: Option<u64>,

    /// Offset of completion
    pub done_ms: Option<u64>,
}

/// Progress section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressToml {
    /// Time until progress reaches 100%
    pub total_ms: Option<u64>,

    /// Gap between progress samples
    pub sample_interval_ms: Option<u64>,
}

/// One explicitly declared element
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementToml {
    /// Stable identifier
    pub id: String,

    /// Display label (defaults to the id)
    #[serde(default)]
    pub label: Option<String>,

    /// Reveal offset (defaults to the stagger position); must not be negative
    #[serde(default)]
    pub offset_ms: Option<i64>,
}

/// Assembly section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyToml {
    /// Offset of the first element
    pub element_base_ms: Option<u64>,

    /// Gap between consecutive elements
    pub element_stride_ms: Option<u64>,

    /// Explicit element list replacing the defaults
    pub elements: Option<Vec<ElementToml>>,
}

/// Root TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingToml {
    /// Landing typewriter settings
    pub landing: LandingToml,

    /// Phase offsets
    pub phases: PhasesToml,

    /// Progress timing
    pub progress: ProgressToml,

    /// Assembly elements
    pub assembly: AssemblyToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Landing typewriter configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LandingConfig {
    /// Transcript to type
    pub script: Script,
    /// Line pacing
    pub pacing: TypewriterPacing,
}

/// Stagger the element offsets were resolved against
///
/// Elements whose offset was declared explicitly are pinned; a later layer
/// that changes the stagger only moves the others.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ElementStagger {
    base: Duration,
    stride: Duration,
    pinned: Vec<bool>,
}

impl Default for ElementStagger {
    fn default() -> Self {
        Self {
            base: DEFAULT_ELEMENT_BASE,
            stride: DEFAULT_ELEMENT_STRIDE,
            pinned: Vec::new(),
        }
    }
}

impl ElementStagger {
    /// Replace whichever half of the stagger is given and move unpinned elements
    fn apply(
        &mut self,
        elements: &mut [ElementSpec],
        base: Option<Duration>,
        stride: Option<Duration>,
    ) {
        self.base = base.unwrap_or(self.base);
        self.stride = stride.unwrap_or(self.stride);

        for (index, spec) in elements.iter_mut().enumerate() {
            if self.pinned.get(index).copied().unwrap_or(false) {
                continue;
            }
            spec.offset = stagger_offset(self.base, self.stride, index);
        }
    }
}

/// Fully resolved onboarding configuration
#[derive(Clone, Debug)]
pub struct OnboardingConfig {
    /// Landing typewriter
    pub landing: LandingConfig,

    /// Assembly sequence
    pub assembly: AssemblyConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,

    /// How element offsets were derived
    stagger: ElementStagger,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            landing: LandingConfig::default(),
            assembly: AssemblyConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
            stagger: ElementStagger::default(),
        }
    }
}

impl OnboardingConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check the configuration can be mounted
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.assembly
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/onboarding/onboarding.toml` or
/// `~/.config/onboarding/onboarding.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("onboarding").join("onboarding.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI arguments are not handled here; the caller applies
/// [`ConfigOverrides`] afterwards and re-validates.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting configuration is invalid.
pub fn load_config() -> Result<OnboardingConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<OnboardingConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<OnboardingConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = OnboardingConfig::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: OnboardingToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut OnboardingConfig, toml: &OnboardingToml) -> Result<(), ConfigError> {
    // Landing settings
    let pacing = &mut config.landing.pacing;
    if let Some(ms) = toml.landing.command_line_start_ms {
        pacing.command.line_start = millis(ms);
    }
    if let Some(ms) = toml.landing.command_char_ms {
        pacing.command.per_char = millis(ms);
    }
    if let Some(ms) = toml.landing.output_line_start_ms {
        pacing.output.line_start = millis(ms);
    }
    if let Some(ms) = toml.landing.output_char_ms {
        pacing.output.per_char = millis(ms);
    }
    if let Some(lines) = &toml.landing.lines {
        config.landing.script = Script::from_texts(lines.iter().cloned());
    }

    // Phase settings
    let phases = &mut config.assembly.phases;
    if let Some(ms) = toml.phases.assembling_ms {
        phases.assembling = millis(ms);
    }
    if let Some(ms) = toml.phases.final_ms {
        phases.final_ = millis(ms);
    }
    if let Some(ms) = toml.phases.exit_ms {
        phases.exit = millis(ms);
    }
    if let Some(ms) = toml.phases.done_ms {
        phases.done = millis(ms);
    }

    // Progress settings
    if let Some(ms) = toml.progress.total_ms {
        config.assembly.progress.total_duration = millis(ms);
    }
    if let Some(ms) = toml.progress.sample_interval_ms {
        config.assembly.progress.sample_interval = millis(ms);
    }

    // Element settings
    if let Some(elements) = &toml.assembly.elements {
        config.assembly.elements = elements_from_toml(elements)?;
        config.stagger.pinned = elements.iter().map(|e| e.offset_ms.is_some()).collect();
    }
    config.stagger.apply(
        &mut config.assembly.elements,
        toml.assembly.element_base_ms.map(millis),
        toml.assembly.element_stride_ms.map(millis),
    );

    Ok(())
}

/// Materialize declared elements; unset offsets are filled in by the stagger
fn elements_from_toml(elements: &[ElementToml]) -> Result<Vec<ElementSpec>, ConfigError> {
    elements
        .iter()
        .map(|element| {
            let offset = match element.offset_ms {
                Some(ms) => {
                    let ms = u64::try_from(ms).map_err(|_| {
                        ConfigError::ValidationError(format!(
                            "element '{}' has negative offset {ms}ms",
                            element.id
                        ))
                    })?;
                    millis(ms)
                }
                None => Duration::ZERO,
            };
            let label = element.label.clone().unwrap_or_else(|| element.id.clone());
            Ok(ElementSpec::new(element.id.clone(), label, offset))
        })
        .collect()
}

/// Read a millisecond value from the environment
fn env_millis<F>(env: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(millis(ms)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut OnboardingConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(total) = env_millis(&env, "ONBOARDING_PROGRESS_TOTAL_MS") {
        config.assembly.progress.total_duration = total;
        config.source = ConfigSource::Env;
    }
    if let Some(interval) = env_millis(&env, "ONBOARDING_SAMPLE_INTERVAL_MS") {
        config.assembly.progress.sample_interval = interval;
        config.source = ConfigSource::Env;
    }

    let base = env_millis(&env, "ONBOARDING_ELEMENT_BASE_MS");
    let stride = env_millis(&env, "ONBOARDING_ELEMENT_STRIDE_MS");
    if base.is_some() || stride.is_some() {
        config
            .stagger
            .apply(&mut config.assembly.elements, base, stride);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Configuration overrides from command-line arguments
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Time until progress reaches 100%
    pub progress_total_ms: Option<u64>,

    /// Gap between progress samples
    pub sample_interval_ms: Option<u64>,

    /// Element stagger as `(base, stride)`
    pub element_stagger_ms: Option<(u64, u64)>,
}

impl ConfigOverrides {
    /// Create empty overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the progress duration
    #[must_use]
    pub fn with_progress_total_ms(mut self, ms: u64) -> Self {
        self.progress_total_ms = Some(ms);
        self
    }

    /// Override the progress sample interval
    #[must_use]
    pub fn with_sample_interval_ms(mut self, ms: u64) -> Self {
        self.sample_interval_ms = Some(ms);
        self
    }

    /// Re-stagger elements without an explicit offset at `base + i × stride`
    #[must_use]
    pub fn with_element_stagger_ms(mut self, base: u64, stride: u64) -> Self {
        self.element_stagger_ms = Some((base, stride));
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.progress_total_ms.is_none()
            && self.sample_interval_ms.is_none()
            && self.element_stagger_ms.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut OnboardingConfig) {
        if let Some(ms) = self.progress_total_ms {
            config.assembly.progress.total_duration = millis(ms);
            config.source = ConfigSource::Cli;
        }
        if let Some(ms) = self.sample_interval_ms {
            config.assembly.progress.sample_interval = millis(ms);
            config.source = ConfigSource::Cli;
        }
        if let Some((base, stride)) = self.element_stagger_ms {
            config.stagger.apply(
                &mut config.assembly.elements,
                Some(millis(base)),
                Some(millis(stride)),
            );
            config.source = ConfigSource::Cli;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = OnboardingConfig::default();

        assert_eq!(config.assembly.phases.done, Duration::from_millis(7200));
        assert_eq!(
            config.assembly.progress.total_duration,
            Duration::from_millis(6200)
        );
        assert_eq!(config.assembly.elements.len(), 6);
        assert_eq!(config.landing.script.len(), 14);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        // Should return Some path (depends on environment)
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("onboarding"));
            assert!(p.to_string_lossy().ends_with("onboarding.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[landing]
command_line_start_ms = 250
command_char_ms = 20
output_line_start_ms = 150
output_char_ms = 10
lines = ["$ whoami", "Nikhil"]

[phases]
assembling_ms = 400
final_ms = 2300
exit_ms = 3250
done_ms = 3600

[progress]
total_ms = 3100
sample_interval_ms = 50

[assembly]
element_base_ms = 600
element_stride_ms = 300
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        // Landing
        assert_eq!(
            config.landing.pacing.command.line_start,
            Duration::from_millis(250)
        );
        assert_eq!(config.landing.pacing.output.per_char, Duration::from_millis(10));
        assert_eq!(config.landing.script.texts(), vec!["$ whoami", "Nikhil"]);
        assert!(config.landing.script.lines()[0].is_command());

        // Phases
        assert_eq!(config.assembly.phases.assembling, Duration::from_millis(400));
        assert_eq!(config.assembly.phases.done, Duration::from_millis(3600));

        // Progress
        assert_eq!(
            config.assembly.progress.sample_interval,
            Duration::from_millis(50)
        );

        // Elements keep default identities on the new stagger
        assert_eq!(config.assembly.elements[0].id, "html");
        assert_eq!(config.assembly.elements[5].offset, Duration::from_millis(2100));

        // Source should be File
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml(
            r"
[progress]
total_ms = 5000
",
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        // Specified values
        assert_eq!(
            config.assembly.progress.total_duration,
            Duration::from_millis(5000)
        );

        // Default values should be preserved
        assert_eq!(
            config.assembly.progress.sample_interval,
            Duration::from_millis(100)
        );
        assert_eq!(config.assembly.phases.assembling, Duration::from_millis(800));
        assert_eq!(config.assembly.elements[1].offset, Duration::from_millis(1800));
    }

    #[test]
    fn test_parse_empty_toml() {
        let file = write_toml("");

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.assembly, AssemblyConfig::default());
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_explicit_elements() {
        let file = write_toml(
            r#"
[assembly]
element_base_ms = 1000
element_stride_ms = 100

[[assembly.elements]]
id = "core"

[[assembly.elements]]
id = "edge"
label = "Edge Cache"

[[assembly.elements]]
id = "ship"
label = "Ship"
offset_ms = 50
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        let elements = &config.assembly.elements;

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].label, "core");
        assert_eq!(elements[0].offset, Duration::from_millis(1000));
        assert_eq!(elements[1].label, "Edge Cache");
        assert_eq!(elements[1].offset, Duration::from_millis(1100));
        assert_eq!(elements[2].offset, Duration::from_millis(50));
    }

    #[test]
    fn test_negative_offset_rejected() {
        let file = write_toml(
            r#"
[[assembly.elements]]
id = "html"
offset_ms = -5
"#,
        );

        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_duplicate_elements_rejected() {
        let file = write_toml(
            r#"
[[assembly.elements]]
id = "api"

[[assembly.elements]]
id = "api"
"#,
        );

        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_out_of_order_phases_rejected() {
        let file = write_toml(
            r"
[phases]
exit_ms = 100
",
        );

        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/to/onboarding.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let config = load_config_with_env(None, no_env).unwrap();
        assert_eq!(config.assembly, AssemblyConfig::default());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[progress\ntotal_ms = ");

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // =========================================================================
    // Override Priority Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml(
            r"
[progress]
total_ms = 5000
",
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("ONBOARDING_PROGRESS_TOTAL_MS", "4000"),
            ("ONBOARDING_ELEMENT_STRIDE_MS", "100"),
            ("ONBOARDING_SAMPLE_INTERVAL_MS", "not-a-number"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        assert_eq!(
            config.assembly.progress.total_duration,
            Duration::from_millis(4000)
        );
        assert_eq!(
            config.assembly.progress.sample_interval,
            Duration::from_millis(100)
        );
        assert_eq!(config.assembly.elements[2].offset, Duration::from_millis(1400));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_stagger_keeps_explicit_offsets() {
        let file = write_toml(
            r#"
[assembly]
element_stride_ms = 100

[[assembly.elements]]
id = "late"
offset_ms = 5000

[[assembly.elements]]
id = "early"
offset_ms = 50
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([("ONBOARDING_ELEMENT_BASE_MS", "1000")]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        let offsets: Vec<Duration> = config.assembly.elements.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![Duration::from_millis(5000), Duration::from_millis(50)]);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_base_keeps_file_stride() {
        let file = write_toml(
            r#"
[assembly]
element_base_ms = 400
element_stride_ms = 100

[[assembly.elements]]
id = "core"

[[assembly.elements]]
id = "pinned"
offset_ms = 50

[[assembly.elements]]
id = "edge"
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([("ONBOARDING_ELEMENT_BASE_MS", "1000")]);

        let mut config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        let offsets = |config: &OnboardingConfig| -> Vec<Duration> {
            config.assembly.elements.iter().map(|e| e.offset).collect()
        };
        assert_eq!(
            offsets(&config),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(50),
                Duration::from_millis(1200),
            ]
        );

        ConfigOverrides::new()
            .with_element_stagger_ms(0, 10)
            .apply(&mut config);
        assert_eq!(
            offsets(&config),
            vec![Duration::ZERO, Duration::from_millis(50), Duration::from_millis(20)]
        );
    }

    #[test]
    fn test_cli_overrides_env() {
        let env: HashMap<&str, &str> = HashMap::from([("ONBOARDING_PROGRESS_TOTAL_MS", "4000")]);
        let mut config =
            load_config_with_env(None, |key| env.get(key).map(ToString::to_string)).unwrap();

        ConfigOverrides::new()
            .with_progress_total_ms(3000)
            .apply(&mut config);

        assert_eq!(
            config.assembly.progress.total_duration,
            Duration::from_millis(3000)
        );
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_apply() {
        let mut config = OnboardingConfig::default();
        let overrides = ConfigOverrides::new()
            .with_sample_interval_ms(20)
            .with_element_stagger_ms(0, 10);
        assert!(!overrides.is_empty());

        overrides.apply(&mut config);

        assert_eq!(
            config.assembly.progress.sample_interval,
            Duration::from_millis(20)
        );
        assert_eq!(config.assembly.elements[0].offset, Duration::ZERO);
        assert_eq!(config.assembly.elements[3].offset, Duration::from_millis(30));
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = OnboardingConfig::default();
        let overrides = ConfigOverrides::new();
        assert!(overrides.is_empty());

        overrides.apply(&mut config);

        assert_eq!(config.assembly, AssemblyConfig::default());
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let mut config = OnboardingConfig::default();
        ConfigOverrides::new()
            .with_sample_interval_ms(0)
            .apply(&mut config);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sample interval"));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ValidationError("bad value".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad value");
    }
}
