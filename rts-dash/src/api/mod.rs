//! HTTP API handlers for rts-dash

pub mod buildinfo;
pub mod dashboard;
pub mod health;
pub mod proxy;
pub mod views;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

pub use buildinfo::get_build_info;
pub use dashboard::{get_dashboard, refetch, upload_csv};
pub use health::health_routes;
pub use proxy::proxy_sheet;
pub use views::{get_filter_options, get_report, get_summary, list_shipments};

/// JSON `{ "error": message }` response with the given status
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
