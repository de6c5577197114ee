//! Carrier-status header reconciliation
//!
//! The carrier-status column arrives under several spellings depending on
//! who exported the sheet. The lookup below is an ordered cascade; the order
//! is part of the contract and must not be reshuffled.

use crate::parser::RawRow;

/// Exact normalized keys, tried first and in this order
const EXACT_KEYS: [&str; 3] = ["lastest_spx_status", "latest_spx_status", "spx_status"];

/// Compact (alphanumeric-only) spellings, tried in this order
const COMPACT_CANDIDATES: [&str; 5] = [
    "lastestspxstatus",
    "latestspxstatus",
    "spxstatus",
    "statusspx",
    "status",
];

/// Lower-case and keep only ASCII letters and digits
pub fn compact_key(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Resolve the carrier status for one row
///
/// Always returns a string; `""` when nothing in the row looks like a
/// carrier-status column. The exact and compact steps skip empty values; the
/// substring fallbacks pick the first matching column even when it is blank.
pub fn resolve_spx_status(row: &RawRow) -> String {
    for key in EXACT_KEYS {
        if let Some(value) = row.get(key).filter(|v| !v.is_empty()) {
            return value.to_string();
        }
    }

    let compacted: Vec<(String, &str)> = row
        .iter()
        .map(|(key, value)| (compact_key(key), value))
        .collect();

    for candidate in COMPACT_CANDIDATES {
        if let Some((_, value)) = compacted
            .iter()
            .find(|(key, value)| key == candidate && !value.is_empty())
        {
            return value.to_string();
        }
    }

    let first_containing = |needles: &[&str]| {
        compacted
            .iter()
            .find(|(key, _)| needles.iter().all(|n| key.contains(n)))
            .map(|(_, value)| value.to_string())
    };

    first_containing(&["spx", "status"][..])
        .or_else(|| first_containing(&["spx"][..]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_misspelled_exact_key_wins_first() {
        let r = row(&[
            ("spx_status", "C"),
            ("latest_spx_status", "B"),
            ("lastest_spx_status", "A"),
        ]);
        assert_eq!(resolve_spx_status(&r), "A");
    }

    #[test]
    fn test_exact_keys_in_order() {
        let r = row(&[("spx_status", "C"), ("latest_spx_status", "B")]);
        assert_eq!(resolve_spx_status(&r), "B");
        let r = row(&[("spx_status", "C")]);
        assert_eq!(resolve_spx_status(&r), "C");
    }

    #[test]
    fn test_exact_match_beats_near_miss() {
        let r = row(&[("SPX_Status__1", "FUZZY"), ("spx_status", "EXACT")]);
        assert_eq!(resolve_spx_status(&r), "EXACT");
    }

    #[test]
    fn test_raw_misspelled_header_resolves_through_compaction() {
        let r = row(&[("Lastest_SPX_Status", "DELIVERED")]);
        assert_eq!(resolve_spx_status(&r), "DELIVERED");
    }

    #[test]
    fn test_compact_candidates_follow_list_order() {
        // "status" appears first in the row but "statusspx" ranks higher
        let r = row(&[("Status", "GENERIC"), ("Status SPX", "SPECIFIC")]);
        assert_eq!(resolve_spx_status(&r), "SPECIFIC");
    }

    #[test]
    fn test_empty_exact_value_falls_through() {
        let r = row(&[("lastest_spx_status", ""), ("latest_spx_status", "IN_TRANSIT")]);
        assert_eq!(resolve_spx_status(&r), "IN_TRANSIT");
    }

    #[test]
    fn test_substring_fallbacks() {
        let r = row(&[("id", "1"), ("current spx status (ops)", "LOST")]);
        assert_eq!(resolve_spx_status(&r), "LOST");

        let r = row(&[("id", "1"), ("spx_state", "HELD")]);
        assert_eq!(resolve_spx_status(&r), "HELD");
    }

    #[test]
    fn test_spx_and_status_beats_spx_only() {
        let r = row(&[("spx_hub", "HUB"), ("spx_last_status_seen", "RETURNED")]);
        assert_eq!(resolve_spx_status(&r), "RETURNED");
    }

    #[test]
    fn test_blank_status_column_does_not_fall_through_to_spx_only() {
        let r = row(&[
            ("shipment_id", "A1"),
            ("status_spx_final", ""),
            ("spx_hub", "SP-CJ"),
        ]);
        assert_eq!(resolve_spx_status(&r), "");
    }

    #[test]
    fn test_no_spx_key_yields_empty() {
        let r = row(&[("shipment_id", "A1"), ("days_stuck", "4")]);
        assert_eq!(resolve_spx_status(&r), "");
        assert_eq!(resolve_spx_status(&RawRow::default()), "");
    }

    #[test]
    fn test_compact_key() {
        assert_eq!(compact_key("Lastest_SPX_Status"), "lastestspxstatus");
        assert_eq!(compact_key("SPX Status #1"), "spxstatus1");
        assert_eq!(compact_key("Status Situação"), "statussituao");
    }

    #[test]
    fn test_accented_header_does_not_block_candidate() {
        let r = row(&[("Status ç", "RETURNING")]);
        assert_eq!(resolve_spx_status(&r), "RETURNING");
    }
}
