//! Periodic refresh of the note list.
//!
//! [`NotePoller::start`] spawns a task that fetches `/notes` on a fixed
//! interval and publishes each result on a `watch` channel. The returned
//! [`PollHandle`] owns the task: [`PollHandle::stop`] shuts it down and waits
//! for it, and dropping the handle aborts it. Nothing keeps polling once the
//! consumer is gone.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{ClientError, NotesClient};
use crate::models::Note;

/// State published after every poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    /// Notes from the last successful fetch.
    pub notes: Vec<Note>,
    /// When `notes` was fetched. `None` until the first success.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Error from the most recent poll, cleared by the next success.
    pub error: Option<String>,
    /// Number of completed polls, successful or not.
    pub generation: u64,
}

impl PollSnapshot {
    fn record(&mut self, outcome: Result<Vec<Note>, ClientError>) {
        self.generation += 1;
        match outcome {
            Ok(notes) => {
                self.notes = notes;
                self.fetched_at = Some(Utc::now());
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Poll failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Shortest accepted refresh interval. `tokio::time::interval` panics on zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

pub struct NotePoller;

impl NotePoller {
    /// Start polling. The first fetch happens immediately. Intervals below
    /// [`MIN_INTERVAL`] are raised to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(client: NotesClient, interval: Duration) -> PollHandle {
        if interval < MIN_INTERVAL {
            tracing::warn!(
                "Poll interval {:?} is below the minimum, using {:?}",
                interval,
                MIN_INTERVAL
            );
        }
        let interval = interval.max(MIN_INTERVAL);
        let (snapshot_tx, snapshot_rx) = watch::channel(PollSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tracing::debug!(
            "Starting poller for {} every {:?}",
            client.base_url(),
            interval
        );
        let task = tokio::spawn(run(client, interval, snapshot_tx, shutdown_rx));

        PollHandle {
            snapshots: snapshot_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn run(
    client: NotesClient,
    interval: Duration,
    snapshots: watch::Sender<PollSnapshot>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        // An in-flight fetch is abandoned on shutdown.
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            outcome = client.list_notes() => outcome,
        };
        snapshots.send_modify(|snapshot| snapshot.record(outcome));
    }

    tracing::debug!("Poller stopped");
}

/// Owner of a running poll task.
pub struct PollHandle {
    snapshots: watch::Receiver<PollSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// A new receiver observing the same snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> PollSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next published snapshot. `None` once the task has ended.
    pub async fn next(&mut self) -> Option<PollSnapshot> {
        self.snapshots.changed().await.ok()?;
        Some(self.snapshots.borrow_and_update().clone())
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poll task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
