//! Passthrough proxy for the spreadsheet CSV export
//!
//! Lets a browser client fetch the export through this service when it
//! cannot reach the spreadsheet host directly. The body is returned as-is.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rts_common::{IngestError, SheetSource};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error_response;
use crate::AppState;

/// Query parameters for the sheet proxy
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    #[serde(rename = "sheetId")]
    pub sheet_id: Option<String>,
    #[serde(rename = "tabName")]
    pub tab_name: Option<String>,
}

/// GET /api/sheet?sheetId=..&tabName=..
pub async fn proxy_sheet(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ProxyError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(sheet_id), Some(tab_name)) = (non_empty(query.sheet_id), non_empty(query.tab_name))
    else {
        return Err(ProxyError::MissingParameters);
    };

    let sheet = SheetSource::new(sheet_id, tab_name).with_base_url(state.export_base_url.clone());
    debug!(sheet_id = %sheet.sheet_id, tab = %sheet.tab_name, "Proxying sheet export");

    let body = state
        .resolver
        .fetch_export(&sheet)
        .await
        .map_err(ProxyError::Upstream)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Sheet proxy errors
#[derive(Debug)]
pub enum ProxyError {
    MissingParameters,
    Upstream(IngestError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::MissingParameters => error_response(
                StatusCode::BAD_REQUEST,
                "Missing sheetId or tabName query parameter",
            ),
            ProxyError::Upstream(IngestError::Fetch { status }) => {
                warn!(status, "Upstream sheet export returned an error");
                let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                error_response(code, format!("Failed to fetch sheet: HTTP {}", status))
            }
            ProxyError::Upstream(err) => {
                warn!(kind = err.kind(), "Sheet proxy failed: {}", err);
                error_response(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}
