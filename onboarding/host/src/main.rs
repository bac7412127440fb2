//! Onboarding Host - Command-line driver for the onboarding sequence
//!
//! Mounts the onboarding flow, runs it in real time and prints what changes:
//! the landing transcript as it is typed, then assembly phases, element pills
//! and build progress, until the main screen takes over.
//!
//! # Usage
//!
//! ```bash
//! # Watch the landing, press Enter to start assembly
//! onboarding-host
//!
//! # Unattended run straight through, as JSON lines
//! onboarding-host --auto-proceed --json
//!
//! # Only the assembly sequence, compressed
//! onboarding-host --skip-landing --progress-total-ms 3100 --sample-interval-ms 50
//!
//! # Custom config file with verbose logging
//! onboarding-host --config ./onboarding.toml --log-level debug
//! ```
//!
//! # Environment Variables
//!
//! - `ONBOARDING_CONFIG`: Configuration file path
//! - `ONBOARDING_LOG_LEVEL`: Log level (trace, debug, info, warn, error)
//! - `ONBOARDING_PROGRESS_TOTAL_MS`, `ONBOARDING_SAMPLE_INTERVAL_MS`,
//!   `ONBOARDING_ELEMENT_BASE_MS`, `ONBOARDING_ELEMENT_STRIDE_MS`: timing
//!   overrides
//! - `RUST_LOG`: Overrides the log filter entirely
//!
//! # Signals
//!
//! - `SIGINT`: Tears the flow down; no completion is reported

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use onboarding_core::{
    default_config_path, load_config_from_path, spawn_timeline, ConfigOverrides, FlowError,
    OnboardingFlow, Screen, TimelineHandle,
};

use render::{Format, Renderer};

/// Onboarding Host - Plays the portfolio's staged onboarding sequence
#[derive(Parser, Debug)]
#[command(name = "onboarding-host")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "ONBOARDING_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "ONBOARDING_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Print snapshots as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Leave the landing as soon as the transcript is typed
    #[arg(short = 'y', long)]
    auto_proceed: bool,

    /// Start directly with the assembly sequence
    #[arg(long)]
    skip_landing: bool,

    /// Time until build progress reaches 100%
    #[arg(long, value_name = "MS")]
    progress_total_ms: Option<u64>,

    /// Gap between build progress samples
    #[arg(long, value_name = "MS")]
    sample_interval_ms: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ms) = self.progress_total_ms {
            overrides = overrides.with_progress_total_ms(ms);
        }
        if let Some(ms) = self.sample_interval_ms {
            overrides = overrides.with_sample_interval_ms(ms);
        }
        overrides
    }
}

/// Initialize logging
///
/// Logs go to stderr so stdout stays clean for snapshots.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "onboarding_host={level},onboarding_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}

/// Ask the flow to leave the landing
async fn proceed(handle: &TimelineHandle<OnboardingFlow>) -> Result<()> {
    match handle.command(OnboardingFlow::proceed).await? {
        Ok(()) => Ok(()),
        Err(e @ (FlowError::LandingNotReady | FlowError::WrongScreen { .. })) => {
            warn!(error = %e, "Proceed ignored");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to mount assembly sequence"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Onboarding host starting");

    // Resolve configuration: file < env < CLI
    let config_path = args.config.clone().or_else(default_config_path);
    let mut config =
        load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after applying CLI overrides")?;
    info!(source = %config.source(), "Configuration loaded");

    let flow = if args.skip_landing {
        OnboardingFlow::starting_at_assembly(config)
    } else {
        OnboardingFlow::new(config)
    }
    .context("Failed to mount onboarding flow")?;

    let handle = spawn_timeline(flow);
    let mut snapshots = WatchStream::new(handle.subscribe());
    let mut renderer = Renderer::new(
        if args.json { Format::Json } else { Format::Text },
        args.auto_proceed,
    );

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = !args.auto_proceed;
    let mut proceed_requested = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, tearing down");
                break;
            }
            snapshot = snapshots.next() => {
                let Some(snapshot) = snapshot else {
                    warn!("Flow stopped unexpectedly");
                    break;
                };

                for line in renderer.render(&snapshot) {
                    println!("{line}");
                }

                let landing_ready = snapshot.landing.as_ref().is_some_and(|l| l.ready);
                if args.auto_proceed && landing_ready && !proceed_requested {
                    proceed_requested = true;
                    proceed(&handle).await?;
                }

                if snapshot.screen == Screen::Main {
                    info!(elapsed_ms = snapshot.elapsed_ms, "Onboarding complete");
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => proceed(&handle).await?,
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    handle.teardown().await;
    Ok(())
}
