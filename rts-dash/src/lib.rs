//! rts-dash library - RTS shipment dashboard service
//!
//! Serves the ingested shipment dataset over HTTP: the dataset contract
//! (snapshot, refetch, upload), read-only views over it, and a passthrough
//! proxy for the spreadsheet CSV export.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use rts_common::{RefreshHandle, SourceResolver};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Entry point into the refresh scheduler (snapshot, refetch, upload)
    pub refresh: RefreshHandle,
    /// HTTP client used by the sheet proxy
    pub resolver: SourceResolver,
    /// Export endpoint the proxy forwards to
    pub export_base_url: String,
}

impl AppState {
    pub fn new(refresh: RefreshHandle, resolver: SourceResolver, export_base_url: String) -> Self {
        Self {
            refresh,
            resolver,
            export_base_url,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let dataset = Router::new()
        .route("/api/dashboard", get(api::get_dashboard))
        .route("/api/refetch", post(api::refetch))
        .route(
            "/api/upload",
            post(api::upload_csv).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/shipments", get(api::list_shipments))
        .route("/api/summary", get(api::get_summary))
        .route("/api/report", get(api::get_report))
        .route("/api/filters", get(api::get_filter_options));

    let passthrough = Router::new()
        .route("/api/sheet", get(api::proxy_sheet))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(dataset)
        .merge(passthrough)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
