//! Dashboard state container
//!
//! The dataset and its load status live in one explicit struct with a pure
//! update function. The scheduler is the only writer; HTTP handlers and other
//! consumers read snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::IngestError;
use crate::model::ShipmentRecord;
use crate::time;

/// Load status state machine: `Idle -> Loading -> {Ready, Failed}`
///
/// `Ready` and `Failed` are soft terminals; both accept a new load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Input to [`DashboardState::apply`]
#[derive(Debug)]
pub enum IngestEvent {
    /// An ingestion began
    Started,
    /// An ingestion produced a full record set
    Succeeded {
        records: Vec<ShipmentRecord>,
        source_label: String,
    },
    /// An ingestion failed
    Failed(IngestError),
}

/// The process-wide dataset and its status
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub status: LoadStatus,
    /// Current record set; replaced wholesale, never edited in place
    pub data: Arc<[ShipmentRecord]>,
    /// User-facing message of the last failure, cleared on success
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub suggest_upload: bool,
    /// Where the current `data` came from
    pub source_label: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            status: LoadStatus::Idle,
            data: Arc::from(Vec::new()),
            error: None,
            error_kind: None,
            suggest_upload: false,
            source_label: None,
            last_updated: None,
        }
    }

    /// Apply one ingestion event
    ///
    /// A failure keeps whatever data was loaded before so a transient error
    /// does not blank a good view.
    pub fn apply(&mut self, event: IngestEvent) {
        match event {
            IngestEvent::Started => {
                self.status = LoadStatus::Loading;
            }
            IngestEvent::Succeeded {
                records,
                source_label,
            } => {
                self.status = LoadStatus::Ready;
                self.data = Arc::from(records);
                self.error = None;
                self.error_kind = None;
                self.suggest_upload = false;
                self.source_label = Some(source_label);
                self.last_updated = Some(time::now());
            }
            IngestEvent::Failed(err) => {
                self.status = LoadStatus::Failed;
                self.error = Some(err.user_message());
                self.error_kind = Some(err.kind());
                self.suggest_upload = err.suggests_upload();
            }
        }
    }

    pub fn loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Read-only view handed to consumers
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            status: self.status,
            data: Arc::clone(&self.data),
            loading: self.loading(),
            error: self.error.clone(),
            error_kind: self.error_kind,
            suggest_upload: self.suggest_upload,
            source: self.source_label.clone(),
            last_updated: self.last_updated,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the dashboard state at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub status: LoadStatus,
    pub data: Arc<[ShipmentRecord]>,
    pub loading: bool,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub suggest_upload: bool,
    pub source: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Shared handle on the dashboard state
///
/// Uses RwLock: many concurrent readers, one writer (the scheduler).
#[derive(Debug, Clone, Default)]
pub struct SharedDashboard {
    inner: Arc<RwLock<DashboardState>>,
}

impl SharedDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn apply(&self, event: IngestEvent) {
        self.inner.write().await.apply(event);
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.inner.read().await.snapshot()
    }
}
