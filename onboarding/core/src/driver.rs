//! Real-time driver
//!
//! Runs a [`Timeline`] inside a tokio task. The task sleeps until the next
//! deadline (or until a command arrives), advances the timeline to the real
//! elapsed time and publishes a fresh snapshot on a `watch` channel.
//!
//! ```text
//!   TimelineHandle ──command──▶ ┌────────────── task ──────────────┐
//!                               │ sleep_until(origin + deadline)   │
//!                               │ timeline.advance_to(elapsed)     │
//!   watch::Receiver ◀─snapshot─ │ snapshots.send_replace(..)       │
//!                               └──────────────────────────────────┘
//! ```
//!
//! [`TimelineHandle::teardown`] aborts the task and waits until it is gone, so
//! nothing the timeline armed can fire once it returns. Dropping the handle
//! only requests the abort.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::lifecycle::Timeline;

/// Capacity of the command queue
const COMMAND_BUFFER: usize = 32;

type Command<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// The driver task is gone
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    /// Task finished or was torn down before the command ran
    #[error("timeline driver has stopped")]
    Stopped,
}

/// Owner-side handle of a spawned timeline
pub struct TimelineHandle<T: Timeline> {
    commands: mpsc::Sender<Command<T>>,
    snapshots: watch::Receiver<T::Snapshot>,
    task: JoinHandle<()>,
}

/// Move `timeline` into a tokio task and start its clock
///
/// Must be called from within a tokio runtime.
pub fn spawn_timeline<T>(timeline: T) -> TimelineHandle<T>
where
    T: Timeline + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(timeline.snapshot());
    let task = tokio::spawn(run(timeline, command_rx, snapshot_tx));

    TimelineHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task,
    }
}

async fn sleep_until_deadline(origin: Instant, deadline: Option<Duration>) {
    match deadline.and_then(|deadline| origin.checked_add(deadline)) {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn run<T: Timeline>(
    mut timeline: T,
    mut commands: mpsc::Receiver<Command<T>>,
    snapshots: watch::Sender<T::Snapshot>,
) {
    let origin = Instant::now();
    let mut accepting = true;
    tracing::debug!("Timeline driver started");

    loop {
        let deadline = timeline.next_deadline();
        if deadline.is_none() && !accepting {
            break;
        }

        tokio::select! {
            () = sleep_until_deadline(origin, deadline) => {
                let now = origin.elapsed().max(deadline.unwrap_or_default());
                timeline.advance_to(now);
            }
            command = commands.recv(), if accepting => {
                timeline.advance_to(origin.elapsed());
                match command {
                    Some(command) => command(&mut timeline),
                    None => accepting = false,
                }
            }
        }

        snapshots.send_replace(timeline.snapshot());
    }

    tracing::debug!(
        elapsed_ms = u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Timeline driver finished"
    );
}

impl<T> TimelineHandle<T>
where
    T: Timeline + Send + 'static,
{
    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> T::Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every future snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T::Snapshot> {
        self.snapshots.clone()
    }

    /// Run `f` on the timeline inside the task, after advancing it to now
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Stopped`] if the task has ended.
    pub async fn command<F, R>(&self, f: F) -> Result<R, DriverError>
    where
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command: Command<T> = Box::new(move |timeline: &mut T| {
            // Receiver may have given up waiting
            let _ = reply_tx.send(f(timeline));
        });

        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::Stopped)?;
        reply_rx.await.map_err(|_| DriverError::Stopped)
    }

    /// Whether the task has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the task and drop the timeline, cancelling all of its timers
    ///
    /// Returns once the task has ended. A timeline step already running on
    /// another worker finishes first; no further step starts.
    pub async fn teardown(mut self) {
        self.task.abort();
        match (&mut self.task).await {
            Ok(()) => {}
            Err(error) if error.is_cancelled() => {}
            Err(error) => {
                tracing::warn!(%error, "Timeline driver task failed before teardown");
            }
        }
        tracing::debug!("Timeline driver torn down");
    }
}

impl<T: Timeline> Drop for TimelineHandle<T> {
    // Best effort; `teardown` is the one that waits
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T: Timeline> std::fmt::Debug for TimelineHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineHandle")
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}
