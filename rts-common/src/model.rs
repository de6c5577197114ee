//! Canonical record type

use serde::{Deserialize, Serialize};

/// One return-to-sender shipment's current state
///
/// Numeric fields are unsigned so a negative day count cannot be represented;
/// string fields are never absent, only empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    /// Opaque shipment identifier
    pub shipment_id: String,
    /// Facility code of the current station (may be empty)
    pub latest_station_name: String,
    /// Free-text categorical owner (header spelling kept from upstream)
    pub responsability: String,
    /// Days at the current facility
    pub days_open_in_station: u32,
    /// Days since the return was initiated
    pub days_open_since_rts: u32,
    /// Days without movement
    pub days_stuck: u32,
    /// Bucket label for `days_stuck`, e.g. "0-5 dias"
    pub stuck_aging: String,
    /// Bucket label for days since drop-off
    pub since_drop_aging: String,
    /// Bucket label for `days_open_in_station`
    pub in_station_aging: String,
    /// Carrier status, resolved through the header fallback cascade
    pub latest_spx_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty_and_zeroed() {
        let record = ShipmentRecord::default();
        assert_eq!(record.shipment_id, "");
        assert_eq!(record.latest_spx_status, "");
        assert_eq!(record.days_stuck, 0);
        assert_eq!(record.days_open_since_rts, 0);
    }

    #[test]
    fn test_serializes_with_canonical_field_names() {
        let record = ShipmentRecord {
            shipment_id: "BR123".into(),
            days_stuck: 4,
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        for field in [
            "shipment_id",
            "latest_station_name",
            "responsability",
            "days_open_in_station",
            "days_open_since_rts",
            "days_stuck",
            "stuck_aging",
            "since_drop_aging",
            "in_station_aging",
            "latest_spx_status",
        ] {
            assert!(obj.contains_key(field), "missing {}", field);
        }
        assert_eq!(obj.len(), 10);
        assert_eq!(obj["days_stuck"], 4);
    }
}
