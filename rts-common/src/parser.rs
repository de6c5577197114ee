//! Tolerant CSV parsing into header-keyed rows
//!
//! Header tokens are normalized so that `"Days Open  In Station"` and
//! `"days_open_in_station"` land on the same key. Row values are kept
//! verbatim; typing happens later in [`crate::coerce`].

use crate::error::IngestError;
use tracing::debug;

/// One data row keyed by normalized header, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    entries: Vec<(String, String)>,
}

impl RawRow {
    /// Build a row from `(key, value)` pairs; keys are used as given
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for an exact key
    ///
    /// With duplicate headers the right-most column wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate `(key, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in column order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a header token: trim, lower-case, whitespace runs become `_`
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse delimited text with a header row into normalized rows
///
/// Blank lines (including lines made only of separators or whitespace) are
/// skipped. Rows shorter than the header simply lack the trailing keys;
/// fields beyond the header are ignored.
pub fn parse_rows(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        debug!("CSV input has no header row");
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| IngestError::Parse(e.to_string()))?;

        if record.iter().all(|field| field.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        let row = RawRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.clone(), value.to_string())),
        );
        rows.push(row);
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        blank_rows_skipped = skipped,
        "Parsed CSV input"
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_collapses_whitespace() {
        assert_eq!(normalize_header("Days Open  In Station"), "days_open_in_station");
        assert_eq!(normalize_header("  Shipment ID "), "shipment_id");
        assert_eq!(normalize_header("Days\tStuck"), "days_stuck");
    }

    #[test]
    fn test_normalize_header_is_idempotent() {
        for raw in ["Days Open  In Station", "Lastest_SPX_Status", " a  b c ", "", "x"] {
            let once = normalize_header(raw);
            assert_eq!(normalize_header(&once), once);
        }
    }

    #[test]
    fn test_parse_scenario_with_missing_value() {
        let rows = parse_rows("Shipment ID,Days Stuck\nA1,7\nA2,\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["shipment_id", "days_stuck"]);
        assert_eq!(rows[0].get("shipment_id"), Some("A1"));
        assert_eq!(rows[0].get("days_stuck"), Some("7"));
        assert_eq!(rows[1].get("days_stuck"), Some(""));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let rows = parse_rows("id,status\n\nA,x\n   \n,\nB,y\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some("B"));
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let rows = parse_rows("id,station\n\"A1\",\"SP, Cajamar\"\n").unwrap();
        assert_eq!(rows[0].get("station"), Some("SP, Cajamar"));
    }

    #[test]
    fn test_short_and_long_rows_are_tolerated() {
        let rows = parse_rows("a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get("b"), None);
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[1].get("c"), Some("3"));
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let rows = parse_rows("\u{feff}Shipment ID\nA1\n").unwrap();
        assert_eq!(rows[0].get("shipment_id"), Some("A1"));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_header_right_most_wins() {
        let rows = parse_rows("status,Status\nfirst,second\n").unwrap();
        assert_eq!(rows[0].get("status"), Some("second"));
        assert_eq!(rows[0].len(), 2);
    }
}
