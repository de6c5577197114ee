//! Ingestion pipeline: source text -> rows -> records

use std::time::Instant;

use tracing::{info, warn};

use crate::coerce::coerce_rows;
use crate::error::IngestError;
use crate::model::ShipmentRecord;
use crate::parser::parse_rows;
use crate::source::{Source, SourceResolver};

/// Parse and coerce raw CSV text into the full record set
///
/// Pure: no I/O, no shared state.
pub fn ingest_text(text: &str) -> Result<Vec<ShipmentRecord>, IngestError> {
    let rows = parse_rows(text)?;
    coerce_rows(&rows)
}

/// Resolve `source` and turn its contents into records
pub async fn ingest(
    resolver: &SourceResolver,
    source: &Source,
) -> Result<Vec<ShipmentRecord>, IngestError> {
    let started = Instant::now();
    let label = source.label();

    let result = resolver
        .resolve(source)
        .await
        .and_then(|text| ingest_text(&text));

    match &result {
        Ok(records) => info!(
            source = %label,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion complete"
        ),
        Err(e) => warn!(
            source = %label,
            kind = e.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion failed: {}",
            e
        ),
    }

    result
}
