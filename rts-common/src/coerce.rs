//! Raw row to typed record coercion
//!
//! Coercion is total: a bad field degrades to its default and the row is
//! kept. A shipment id with unknown aging is still worth showing.

use std::panic::{self, AssertUnwindSafe};

use crate::error::IngestError;
use crate::model::ShipmentRecord;
use crate::parser::RawRow;
use crate::reconcile::resolve_spx_status;

/// Parse a day count; anything unparsable, negative or non-finite becomes 0
pub fn coerce_days(raw: Option<&str>) -> u32 {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };

    match text.parse::<f64>() {
        // `as` saturates at u32::MAX and truncates toward zero
        Ok(value) if value.is_finite() && value > 0.0 => value as u32,
        _ => 0,
    }
}

fn string_field(row: &RawRow, key: &str) -> String {
    row.get(key).unwrap_or_default().to_string()
}

/// Build one record from a raw row
pub fn coerce_record(row: &RawRow) -> ShipmentRecord {
    ShipmentRecord {
        shipment_id: string_field(row, "shipment_id"),
        latest_station_name: string_field(row, "latest_station_name"),
        responsability: string_field(row, "responsability"),
        days_open_in_station: coerce_days(row.get("days_open_in_station")),
        days_open_since_rts: coerce_days(row.get("days_open_since_rts")),
        days_stuck: coerce_days(row.get("days_stuck")),
        stuck_aging: string_field(row, "stuck_aging"),
        since_drop_aging: string_field(row, "since_drop_aging"),
        in_station_aging: string_field(row, "in_station_aging"),
        latest_spx_status: resolve_spx_status(row),
    }
}

/// Build the full record set, one record per row, in row order
///
/// A panic inside record construction is reported as
/// [`IngestError::Coercion`] instead of unwinding into the scheduler.
pub fn coerce_rows(rows: &[RawRow]) -> Result<Vec<ShipmentRecord>, IngestError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        rows.iter().map(coerce_record).collect::<Vec<_>>()
    }))
    .map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        IngestError::Coercion(detail)
    })
}
