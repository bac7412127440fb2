//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT sleep. Timelines schedule work in
//! their own `TimerRegistry` and the driver waits on the next deadline with
//! `sleep_until`, so there is never a reason to sleep for a fixed period or
//! to poll on an interval.
//! **Exceptions**: Test code (after `#[cfg(test)]`).

use architectural_enforcement::find_violations;

const PRODUCTION_DIRS: [&str; 2] = ["onboarding/core/src", "onboarding/host/src"];

fn report(title: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(
        &PRODUCTION_DIRS,
        &["::sleep(", ".sleep(", "thread::sleep"],
    );

    report("Sleep calls found in production code!", &violations);
}

/// Progress, phases and reveals all run on registry deadlines
#[test]
fn test_no_interval_timers_in_production_code() {
    let violations = find_violations(&PRODUCTION_DIRS, &["time::interval", "interval_at("]);

    report("Interval timers found in production code!", &violations);
}
