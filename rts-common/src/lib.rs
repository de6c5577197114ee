//! # RTS Board Common Library
//!
//! Ingestion core shared by the RTS Board services:
//! - Shipment record model
//! - Source resolution (published sheet export, local file, upload)
//! - Tolerant CSV parsing and header reconciliation
//! - Record coercion
//! - Dashboard state container and refresh scheduler
//! - Read-only views (filters, pagination, summary, report)
//! - Configuration loading

pub mod coerce;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod time;
pub mod views;

pub use error::{Error, IngestError, Result};
pub use model::ShipmentRecord;
pub use scheduler::{RefreshHandle, RefreshScheduler};
pub use source::{SheetSource, Source, SourceResolver};
pub use state::{DashboardSnapshot, DashboardState, LoadStatus, SharedDashboard};
