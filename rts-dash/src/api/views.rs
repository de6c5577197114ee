//! Read-only views over the current dataset
//!
//! Every request works on one snapshot, so a refresh landing mid-request
//! cannot mix records from two ingestions.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use rts_common::views::{
    blank_as_none, calculate_pagination, narrative_report, page_of, FilterOptions,
    ShipmentFilter, Summary, DEFAULT_PAGE_SIZE,
};
use rts_common::{time, LoadStatus, ShipmentRecord};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Query parameters for the shipment list: filter fields plus paging
#[derive(Debug, Deserialize)]
pub struct ShipmentQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page_size: Option<usize>,
    pub station: Option<String>,
    pub responsability: Option<String>,
    pub status: Option<String>,
    pub aging: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_days_stuck: Option<u32>,
    pub search: Option<String>,
}

impl ShipmentQuery {
    fn filter(&self) -> ShipmentFilter {
        ShipmentFilter {
            station: self.station.clone(),
            responsability: self.responsability.clone(),
            status: self.status.clone(),
            aging: self.aging.clone(),
            min_days_stuck: self.min_days_stuck,
            search: self.search.clone(),
        }
    }
}

/// Paged shipment list
#[derive(Debug, Serialize)]
pub struct ShipmentsResponse {
    pub total_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub records: Vec<ShipmentRecord>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

/// GET /api/shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentQuery>,
) -> Json<ShipmentsResponse> {
    let snapshot = state.refresh.snapshot().await;
    let matching = query.filter().apply(&snapshot.data);
    let pagination = calculate_pagination(
        matching.len(),
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    let records = page_of(&matching, &pagination)
        .iter()
        .map(|r| (*r).clone())
        .collect();

    Json(ShipmentsResponse {
        total_results: matching.len(),
        page: pagination.page,
        page_size: pagination.page_size,
        total_pages: pagination.total_pages,
        records,
        status: snapshot.status,
        error: snapshot.error,
    })
}

/// GET /api/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Query(filter): Query<ShipmentFilter>,
) -> Json<Summary> {
    let snapshot = state.refresh.snapshot().await;
    let matching = filter.apply(&snapshot.data);
    Json(Summary::from_records(matching.iter().copied()))
}

/// GET /api/report
///
/// Plain-text narrative for the PDF export.
pub async fn get_report(
    State(state): State<AppState>,
    Query(filter): Query<ShipmentFilter>,
) -> Response {
    let snapshot = state.refresh.snapshot().await;
    let matching = filter.apply(&snapshot.data);
    let summary = Summary::from_records(matching.iter().copied());
    let report = narrative_report(&summary, time::now());

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report,
    )
        .into_response()
}

/// GET /api/filters
///
/// Distinct values for the filter dropdowns.
pub async fn get_filter_options(State(state): State<AppState>) -> Json<FilterOptions> {
    let snapshot = state.refresh.snapshot().await;
    Json(FilterOptions::from_records(&snapshot.data))
}
