//! Refresh scheduler
//!
//! One task owns every ingestion. Mount, timer ticks, manual refetch and file
//! uploads all arrive on the same command channel, so two ingestions never
//! run at the same time and the last one to finish is always the last one
//! that was asked for.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::pipeline::ingest;
use crate::source::{Source, SourceResolver};
use crate::state::{DashboardSnapshot, IngestEvent, SharedDashboard};

/// Default period between automatic refreshes
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Shortest accepted refresh period; `interval_at` panics on zero
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(10);

const COMMAND_QUEUE_DEPTH: usize = 16;

enum Command {
    Refetch {
        reply: oneshot::Sender<DashboardSnapshot>,
    },
    Upload {
        name: String,
        contents: String,
        reply: oneshot::Sender<DashboardSnapshot>,
    },
    Shutdown,
}

/// Cloneable entry point for consumers to trigger ingestions
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<Command>,
    state: SharedDashboard,
}

impl RefreshHandle {
    /// Re-run ingestion on the configured source and wait for the outcome
    pub async fn refetch(&self) -> DashboardSnapshot {
        let (reply, rx) = oneshot::channel();
        self.send_and_wait(Command::Refetch { reply }, rx).await
    }

    /// Ingest an uploaded CSV blob, bypassing the network source
    pub async fn handle_file_upload(
        &self,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> DashboardSnapshot {
        let (reply, rx) = oneshot::channel();
        let command = Command::Upload {
            name: name.into(),
            contents: contents.into(),
            reply,
        };
        self.send_and_wait(command, rx).await
    }

    /// Current dashboard state without triggering anything
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.snapshot().await
    }

    /// Ask the scheduler task to stop after the current ingestion
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    async fn send_and_wait(
        &self,
        command: Command,
        rx: oneshot::Receiver<DashboardSnapshot>,
    ) -> DashboardSnapshot {
        if self.tx.send(command).await.is_err() {
            debug!("Refresh scheduler stopped; returning current state");
            return self.state.snapshot().await;
        }
        match rx.await {
            Ok(snapshot) => snapshot,
            Err(_) => self.state.snapshot().await,
        }
    }
}

/// Periodic + on-demand ingestion driver
pub struct RefreshScheduler {
    resolver: SourceResolver,
    source: Source,
    state: SharedDashboard,
    period: Duration,
}

impl RefreshScheduler {
    /// `period` is raised to [`MIN_REFRESH_PERIOD`] when shorter
    pub fn new(
        resolver: SourceResolver,
        source: Source,
        state: SharedDashboard,
        period: Duration,
    ) -> Self {
        Self {
            resolver,
            source,
            state,
            period: period.max(MIN_REFRESH_PERIOD),
        }
    }

    /// Start the scheduler task
    ///
    /// The first ingestion (mount) starts immediately, then one every
    /// `period`. The task ends when all handles are dropped or
    /// [`RefreshHandle::shutdown`] is called.
    pub fn spawn(self) -> (RefreshHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let handle = RefreshHandle {
            tx,
            state: self.state.clone(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        info!(
            source = %self.source.label(),
            period_secs = self.period.as_secs(),
            "Refresh scheduler started"
        );

        // Mount ingestion runs before any queued command is looked at
        self.run_ingestion(&self.source).await;

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Refresh timer fired");
                    self.run_ingestion(&self.source).await;
                }
                command = rx.recv() => match command {
                    Some(Command::Refetch { reply }) => {
                        info!("Manual refetch requested");
                        let snapshot = self.run_ingestion(&self.source).await;
                        let _ = reply.send(snapshot);
                    }
                    Some(Command::Upload { name, contents, reply }) => {
                        info!(file = %name, bytes = contents.len(), "File upload received");
                        let upload = Source::Upload { name, contents };
                        let snapshot = self.run_ingestion(&upload).await;
                        let _ = reply.send(snapshot);
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        info!("Refresh scheduler stopped");
    }

    async fn run_ingestion(&self, source: &Source) -> DashboardSnapshot {
        self.state.apply(IngestEvent::Started).await;

        let event = match ingest(&self.resolver, source).await {
            Ok(records) => IngestEvent::Succeeded {
                records,
                source_label: source.label(),
            },
            Err(err) => IngestEvent::Failed(err),
        };

        self.state.apply(event).await;
        self.state.snapshot().await
    }
}
