//! Dataset contract endpoints
//!
//! `GET /api/dashboard` is the read side; `POST /api/refetch` and
//! `POST /api/upload` are the two ways to trigger a new ingestion. All three
//! answer with the same snapshot shape. An ingestion failure is reported in
//! the snapshot's `error` field, not as an HTTP error.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rts_common::DashboardSnapshot;
use serde::Deserialize;
use tracing::warn;

use super::error_response;
use crate::AppState;

const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.refresh.snapshot().await)
}

/// POST /api/refetch
///
/// Re-runs ingestion on the configured source and returns the result.
pub async fn refetch(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.refresh.refetch().await)
}

/// Query parameters for uploads
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name, for display only
    pub name: Option<String>,
}

/// POST /api/upload?name=<file name>
///
/// Body is the raw CSV file. Ingests it without touching the network source.
pub async fn upload_csv(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Response {
    let contents = match String::from_utf8(body.to_vec()) {
        Ok(text) => text,
        Err(e) => {
            warn!("Rejected upload that is not valid UTF-8: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Uploaded file is not valid UTF-8 text: {}", e),
            );
        }
    };

    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());

    Json(state.refresh.handle_file_upload(name, contents).await).into_response()
}
