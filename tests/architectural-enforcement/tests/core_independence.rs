//! Integration Test: Core Renderer Independence
//!
//! **Policy**: `onboarding-core` is headless. It emits `tracing` events and
//! publishes snapshots; printing, log subscribers and CLI parsing belong to
//! the host.

use std::fs;

use architectural_enforcement::{find_violations, workspace_root};

/// The core manifest pulls in no presentation or binary-only crates
#[test]
fn test_core_manifest_has_no_host_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("onboarding/core/Cargo.toml"))
        .expect("core manifest should be readable");

    let forbidden = ["ratatui", "crossterm", "tracing-subscriber", "clap", "anyhow"];
    let found: Vec<&str> = forbidden
        .iter()
        .copied()
        .filter(|name| {
            manifest
                .lines()
                .any(|line| line.trim_start().starts_with(&format!("{name} ")))
        })
        .collect();

    assert!(
        found.is_empty(),
        "onboarding-core must stay headless, found dependencies: {found:?}"
    );
}

/// The core never writes to the terminal or installs a subscriber
#[test]
fn test_core_never_prints() {
    let violations = find_violations(
        &["onboarding/core/src"],
        &["println!", "eprintln!", "print!(", "dbg!(", "tracing_subscriber"],
    );

    assert!(
        violations.is_empty(),
        "onboarding-core must not print:\n{}",
        violations.join("\n")
    );
}

/// Crates only the tests reach for stay out of the core's `[dependencies]`
#[test]
fn test_core_test_only_crates_are_dev_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("onboarding/core/Cargo.toml"))
        .expect("core manifest should be readable");

    let runtime: Vec<&str> = manifest
        .lines()
        .skip_while(|line| line.trim() != "[dependencies]")
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with('['))
        .collect();

    let test_only = ["serde_json", "tempfile", "pretty_assertions", "tokio-test"];
    let found: Vec<&str> = test_only
        .iter()
        .copied()
        .filter(|name| {
            runtime
                .iter()
                .any(|line| line.trim_start().starts_with(&format!("{name} ")))
        })
        .collect();

    assert!(
        found.is_empty(),
        "onboarding-core lists test-only crates as dependencies: {found:?}"
    );
}
