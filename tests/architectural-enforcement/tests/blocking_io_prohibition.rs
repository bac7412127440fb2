//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Code that runs on the tokio runtime MUST NOT block. The
//! driver task and the host's event loop use `tokio::io` and channels only.
//! **Acceptable**: Reading the configuration file in `config`, which happens
//! once before the runtime drives anything.

use architectural_enforcement::find_violations;

/// Test that the driver and host do not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = find_violations(
        &["onboarding/core/src/driver.rs", "onboarding/host/src"],
        &[
            "std::fs::",
            "std::io::stdin",
            "std::io::Read",
            "std::net::",
            "std::thread::",
            "block_on(",
        ],
    );

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking I/O calls found in async code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - tokio::io::stdin() with AsyncBufReadExt");
        eprintln!("  - tokio::sync channels between tasks");

        panic!(
            "\nFound {} blocking I/O violation(s).\nFix these before merging!",
            violations.len()
        );
    }
}
