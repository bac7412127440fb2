//! Real-time driver tests
//!
//! These run under tokio's paused clock: the runtime jumps straight to the
//! next timer whenever every task is idle, so a 7.2s assembly finishes
//! instantly while `Instant` arithmetic stays exact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use onboarding_core::{
    spawn_timeline, AssemblyConfig, AssemblySequencer, DriverError, FlowError, OnboardingConfig,
    OnboardingFlow, Phase, PhaseSchedule, Screen, Script,
};

fn whoami_config() -> OnboardingConfig {
    let mut config = OnboardingConfig::default();
    config.landing.script = Script::from_texts(["$ whoami", "Nikhil"]);
    config
}

#[tokio::test(start_paused = true)]
async fn test_flow_reaches_main_screen() {
    let handle = spawn_timeline(OnboardingFlow::new(whoami_config()).unwrap());
    let mut snapshots = handle.subscribe();

    let ready = snapshots
        .wait_for(|s| s.landing.as_ref().is_some_and(|landing| landing.ready))
        .await
        .unwrap()
        .clone();
    assert_eq!(ready.elapsed_ms, 1360);
    assert_eq!(ready.screen, Screen::Landing);

    assert_ok!(assert_ok!(handle.command(OnboardingFlow::proceed).await));

    let main = snapshots
        .wait_for(|s| s.screen == Screen::Main)
        .await
        .unwrap()
        .clone();
    assert_eq!(main.elapsed_ms, 1360 + 7200);
    assert_eq!(main.completed_runs, 1);
    assert_eq!(main.assembly.map(|assembly| assembly.phase), Some(Phase::Done));
}

#[tokio::test(start_paused = true)]
async fn test_proceed_rejected_while_typing() {
    let handle = spawn_timeline(OnboardingFlow::new(whoami_config()).unwrap());
    tokio::time::sleep(Duration::from_millis(600)).await;

    let result = handle.command(OnboardingFlow::proceed).await.unwrap();
    assert!(matches!(result, Err(FlowError::LandingNotReady)));
    assert_eq!(handle.snapshot().screen, Screen::Landing);
}

#[tokio::test(start_paused = true)]
async fn test_skip_landing_phases_observed_in_order() {
    let handle = spawn_timeline(OnboardingFlow::starting_at_assembly(whoami_config()).unwrap());
    let mut snapshots = handle.subscribe();
    let mut seen = vec![Phase::Intro];

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if let Some(assembly) = &snapshot.assembly {
            if seen.last() != Some(&assembly.phase) {
                seen.push(assembly.phase);
            }
        }
        if snapshot.screen == Screen::Main {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![Phase::Intro, Phase::Assembling, Phase::Final, Phase::Exit, Phase::Done]
    );
    assert_eq!(handle.snapshot().screen, Screen::Main);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_before_completion_never_notifies() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sequencer = AssemblySequencer::mount(AssemblyConfig::default(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    let handle = spawn_timeline(sequencer);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(handle.snapshot().phase, Phase::Final);

    handle.teardown().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_completion_notifies_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sequencer = AssemblySequencer::mount(AssemblyConfig::default(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    let handle = spawn_timeline(sequencer);
    let mut snapshots = handle.subscribe();
    let done = snapshots.wait_for(|s| s.complete).await.unwrap().clone();

    assert_eq!(done.elapsed_ms, 7200);
    assert_eq!(done.percent, 100);
    assert_eq!(done.ready_count, done.element_count);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_closes_snapshot_channel() {
    let handle = spawn_timeline(OnboardingFlow::new(whoami_config()).unwrap());
    let mut observer = handle.subscribe();

    handle.teardown().await;

    assert!(observer.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_command_after_task_died_reports_stopped() {
    let handle = spawn_timeline(OnboardingFlow::new(whoami_config()).unwrap());

    let crashed: Result<(), DriverError> = handle
        .command(|_flow| panic!("command panicked inside the driver"))
        .await;
    assert_eq!(crashed, Err(DriverError::Stopped));

    let after = handle.command(|flow| flow.screen()).await;
    assert_eq!(after, Err(DriverError::Stopped));
    assert!(handle.is_finished());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_teardown_waits_for_running_completion() {
    let config = AssemblyConfig {
        phases: PhaseSchedule {
            assembling: Duration::from_millis(5),
            final_: Duration::from_millis(10),
            exit: Duration::from_millis(15),
            done: Duration::from_millis(20),
        },
        elements: Vec::new(),
        ..AssemblyConfig::default()
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

    let sequencer = AssemblySequencer::mount(config, move || {
        let _ = started_tx.send(());
        // Holds the driver's worker until the test lets go
        let _ = release_rx.recv();
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    let handle = spawn_timeline(sequencer);
    started_rx.await.unwrap();

    let releaser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        release_tx.send(()).unwrap();
    });

    handle.teardown().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    releaser.await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
