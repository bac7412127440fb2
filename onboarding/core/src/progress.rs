//! Build Progress
//!
//! A percentage derived purely from elapsed time. It runs on its own sampling
//! timer and is deliberately not tied to the phase schedule: the defaults are
//! tuned so both finish close together, nothing more.

use std::time::Duration;

/// Timing of the progress interpolation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Elapsed time at which progress reaches 100
    pub total_duration: Duration,
    /// Gap between samples
    pub sample_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            total_duration: Duration::from_millis(6200),
            sample_interval: Duration::from_millis(100),
        }
    }
}

/// `round(elapsed / total × 100)` clamped to `0..=100`, rounding half up
#[must_use]
pub fn percent_at(elapsed: Duration, total: Duration) -> u8 {
    let total = total.as_micros();
    if total == 0 {
        return 100;
    }
    let scaled = (elapsed.as_micros() * 200 + total) / (total * 2);
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

/// Monotonic progress sampler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressInterpolator {
    config: ProgressConfig,
    elapsed: Duration,
    percent: u8,
    samples: u32,
}

impl ProgressInterpolator {
    /// Start at 0%
    #[must_use]
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            elapsed: Duration::ZERO,
            percent: 0,
            samples: 0,
        }
    }

    /// Record a sample taken at `elapsed`
    ///
    /// The result never drops below an earlier sample.
    pub fn sample(&mut self, elapsed: Duration) -> u8 {
        self.samples = self.samples.saturating_add(1);
        self.elapsed = self.elapsed.max(elapsed);
        self.percent = self
            .percent
            .max(percent_at(self.elapsed, self.config.total_duration));
        self.percent
    }

    /// Instant of the `n`th sample (1-based), on a fixed grid from mount
    ///
    /// `None` once the grid no longer fits in a [`Duration`].
    #[must_use]
    pub fn sample_instant(&self, n: u32) -> Option<Duration> {
        self.config.sample_interval.checked_mul(n)
    }

    /// Latest percentage
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Time of the latest sample
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Samples taken so far
    #[must_use]
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Reached 100%; sampling stops
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }

    /// Timing in use
    #[must_use]
    pub fn config(&self) -> ProgressConfig {
        self.config
    }
}
