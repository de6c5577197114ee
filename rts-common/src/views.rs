//! Read-only projections over a dataset snapshot
//!
//! Filters, pagination, aggregate statistics and the narrative report are
//! all recomputed from the current record slice on every call; nothing here
//! holds on to records between ingestions.

use std::collections::HashMap;
use std::fmt::{Display, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::ShipmentRecord;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on a requested page size
pub const MAX_PAGE_SIZE: usize = 500;

/// Label used when grouping records with an empty category
pub const BLANK_LABEL: &str = "(blank)";

/// Optional record filters; every set field must match
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    /// Exact station code (case-insensitive)
    pub station: Option<String>,
    /// Exact responsability (case-insensitive)
    pub responsability: Option<String>,
    /// Exact carrier status (case-insensitive)
    pub status: Option<String>,
    /// Exact stuck-aging bucket (case-insensitive)
    pub aging: Option<String>,
    /// Minimum `days_stuck`, inclusive
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_days_stuck: Option<u32>,
    /// Substring of the shipment id (case-insensitive)
    pub search: Option<String>,
}

/// Deserialize an optional number, treating a blank value as absent
///
/// HTML forms send `?min_days_stuck=` when the field is left empty.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn eq_ignore_case(wanted: &Option<String>, actual: &str) -> bool {
    match wanted.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(w) => w.to_lowercase() == actual.trim().to_lowercase(),
    }
}

impl ShipmentFilter {
    pub fn matches(&self, record: &ShipmentRecord) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => record
                .shipment_id
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };

        eq_ignore_case(&self.station, &record.latest_station_name)
            && eq_ignore_case(&self.responsability, &record.responsability)
            && eq_ignore_case(&self.status, &record.latest_spx_status)
            && eq_ignore_case(&self.aging, &record.stuck_aging)
            && self.min_days_stuck.map_or(true, |min| record.days_stuck >= min)
            && search_ok
    }

    /// Matching records, in dataset order
    pub fn apply<'a>(&self, records: &'a [ShipmentRecord]) -> Vec<&'a ShipmentRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Pagination metadata calculated from a result count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Index of the first record on the page
    pub offset: usize,
}

/// Clamp `requested_page` into `[1, total_pages]` and compute the offset
///
/// # Examples
/// ```
/// use rts_common::views::calculate_pagination;
///
/// let p = calculate_pagination(120, 3, 50);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// let p = calculate_pagination(120, 99, 50);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = total.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

/// Slice of `items` for the given pagination
pub fn page_of<'a, T>(items: &'a [T], pagination: &Pagination) -> &'a [T] {
    let start = pagination.offset.min(items.len());
    let end = (start + pagination.page_size).min(items.len());
    &items[start..end]
}

/// One group in a breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Aggregate statistics over a record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub avg_days_stuck: f64,
    pub max_days_stuck: u32,
    pub avg_days_open_since_rts: f64,
    pub by_responsability: Vec<GroupCount>,
    pub by_station: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_stuck_aging: Vec<GroupCount>,
}

fn group_by<'a, I>(labels: I) -> Vec<GroupCount>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        let label = match label.trim() {
            "" => BLANK_LABEL,
            trimmed => trimmed,
        };
        *counts.entry(label).or_default() += 1;
    }

    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(label, count)| GroupCount {
            label: label.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    groups
}

fn mean<I: Iterator<Item = u32>>(values: I, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    values.map(u64::from).sum::<u64>() as f64 / total as f64
}

impl Summary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ShipmentRecord>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        let total = records.clone().count();

        Self {
            total,
            avg_days_stuck: mean(records.clone().map(|r| r.days_stuck), total),
            max_days_stuck: records.clone().map(|r| r.days_stuck).max().unwrap_or(0),
            avg_days_open_since_rts: mean(records.clone().map(|r| r.days_open_since_rts), total),
            by_responsability: group_by(records.clone().map(|r| r.responsability.as_str())),
            by_station: group_by(records.clone().map(|r| r.latest_station_name.as_str())),
            by_status: group_by(records.clone().map(|r| r.latest_spx_status.as_str())),
            by_stuck_aging: group_by(records.map(|r| r.stuck_aging.as_str())),
        }
    }
}

/// Distinct values available for each filter field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub stations: Vec<String>,
    pub responsabilities: Vec<String>,
    pub statuses: Vec<String>,
    pub agings: Vec<String>,
}

fn distinct<'a, I: Iterator<Item = &'a str>>(values: I) -> Vec<String> {
    let mut out: Vec<String> = values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

impl FilterOptions {
    pub fn from_records(records: &[ShipmentRecord]) -> Self {
        Self {
            stations: distinct(records.iter().map(|r| r.latest_station_name.as_str())),
            responsabilities: distinct(records.iter().map(|r| r.responsability.as_str())),
            statuses: distinct(records.iter().map(|r| r.latest_spx_status.as_str())),
            agings: distinct(records.iter().map(|r| r.stuck_aging.as_str())),
        }
    }
}

const REPORT_TOP_N: usize = 5;

fn write_breakdown(out: &mut String, title: &str, groups: &[GroupCount], total: usize) {
    let _ = writeln!(out, "{}:", title);
    if groups.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for group in groups.iter().take(REPORT_TOP_N) {
        let share = if total == 0 {
            0.0
        } else {
            group.count as f64 * 100.0 / total as f64
        };
        let _ = writeln!(out, "  - {}: {} ({:.1}%)", group.label, group.count, share);
    }
    if groups.len() > REPORT_TOP_N {
        let _ = writeln!(out, "  ... and {} more", groups.len() - REPORT_TOP_N);
    }
}

/// Plain-text narrative of a summary, for the PDF export
pub fn narrative_report(summary: &Summary, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RTS Shipment Report");
    let _ = writeln!(
        out,
        "Generated {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out);

    if summary.total == 0 {
        let _ = writeln!(out, "No shipments match the current selection.");
        return out;
    }

    let _ = writeln!(
        out,
        "{} shipments are currently in return-to-sender flow. They have been stuck for \
         {:.1} days on average (longest: {} days) and have been open for {:.1} days on \
         average since the return was initiated.",
        summary.total,
        summary.avg_days_stuck,
        summary.max_days_stuck,
        summary.avg_days_open_since_rts
    );

    if let Some(top) = summary.by_responsability.first() {
        let _ = writeln!(
            out,
            "The largest share is owned by {} with {} shipments.",
            top.label, top.count
        );
    }
    if let Some(top) = summary.by_station.first() {
        let _ = writeln!(
            out,
            "Station {} holds the most shipments ({}).",
            top.label, top.count
        );
    }
    let _ = writeln!(out);

    write_breakdown(&mut out, "By responsability", &summary.by_responsability, summary.total);
    write_breakdown(&mut out, "By station", &summary.by_station, summary.total);
    write_breakdown(&mut out, "By carrier status", &summary.by_status, summary.total);
    write_breakdown(&mut out, "By stuck aging", &summary.by_stuck_aging, summary.total);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(id: &str, station: &str, owner: &str, status: &str, aging: &str, stuck: u32) -> ShipmentRecord {
        ShipmentRecord {
            shipment_id: id.into(),
            latest_station_name: station.into(),
            responsability: owner.into(),
            latest_spx_status: status.into(),
            stuck_aging: aging.into(),
            days_stuck: stuck,
            days_open_since_rts: stuck * 2,
            ..Default::default()
        }
    }

    fn sample() -> Vec<ShipmentRecord> {
        vec![
            rec("BR001", "SP-CJ", "Hub", "RETURNING", "0-5 dias", 2),
            rec("BR002", "SP-CJ", "Carrier", "LOST", "6-10 dias", 8),
            rec("BR003", "RJ-01", "Hub", "RETURNING", "0-5 dias", 4),
            rec("XX004", "", "", "", "", 0),
        ]
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let data = sample();
        assert_eq!(ShipmentFilter::default().apply(&data).len(), 4);
    }

    #[test]
    fn test_filter_fields_combine() {
        let data = sample();
        let filter = ShipmentFilter {
            station: Some("sp-cj".into()),
            responsability: Some("HUB".into()),
            ..Default::default()
        };
        let hits = filter.apply(&data);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].shipment_id, "BR001");
    }

    #[test]
    fn test_filter_search_and_min_days() {
        let data = sample();
        let filter = ShipmentFilter {
            search: Some("br".into()),
            min_days_stuck: Some(4),
            ..Default::default()
        };
        let ids: Vec<&str> = filter.apply(&data).iter().map(|r| r.shipment_id.as_str()).collect();
        assert_eq!(ids, vec!["BR002", "BR003"]);
    }

    #[test]
    fn test_filter_folds_accented_letters() {
        let data = vec![
            rec("BR010", "ESTAÇÃO-01", "Expedição", "RETURNING", "0-5 dias", 1),
            rec("BR011", "SP-CJ", "Hub", "RETURNING", "0-5 dias", 1),
        ];
        let filter = ShipmentFilter {
            responsability: Some("EXPEDIÇÃO".into()),
            station: Some("estação-01".into()),
            ..Default::default()
        };
        let hits = filter.apply(&data);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].shipment_id, "BR010");
    }

    #[test]
    fn test_blank_min_days_deserializes_as_none() {
        let filter: ShipmentFilter =
            serde_json::from_str(r#"{"station": "", "min_days_stuck": ""}"#).unwrap();
        assert_eq!(filter.min_days_stuck, None);

        let filter: ShipmentFilter = serde_json::from_str(r#"{"min_days_stuck": " 7 "}"#).unwrap();
        assert_eq!(filter.min_days_stuck, Some(7));

        let filter: ShipmentFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.min_days_stuck, None);

        assert!(serde_json::from_str::<ShipmentFilter>(r#"{"min_days_stuck": "many"}"#).is_err());
    }

    #[test]
    fn test_blank_filter_value_is_ignored() {
        let data = sample();
        let filter = ShipmentFilter {
            status: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&data).len(), 4);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = calculate_pagination(120, 2, 50);
        assert_eq!((p.page, p.total_pages, p.offset), (2, 3, 50));

        let p = calculate_pagination(120, 0, 50);
        assert_eq!((p.page, p.offset), (1, 0));

        let p = calculate_pagination(120, 99, 50);
        assert_eq!((p.page, p.offset), (3, 100));

        let p = calculate_pagination(0, 1, 50);
        assert_eq!((p.page, p.total_pages, p.offset), (1, 0, 0));

        let p = calculate_pagination(10, 1, 0);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.total_pages, 10);
    }

    #[test]
    fn test_page_of() {
        let items: Vec<u32> = (0..7).collect();
        let p = calculate_pagination(items.len(), 3, 3);
        assert_eq!(page_of(&items, &p), &[6]);
        let p = calculate_pagination(0, 1, 3);
        assert!(page_of(&items[..0], &p).is_empty());
    }

    #[test]
    fn test_summary_statistics() {
        let data = sample();
        let summary = Summary::from_records(&data);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.max_days_stuck, 8);
        assert!((summary.avg_days_stuck - 3.5).abs() < f64::EPSILON);
        assert!((summary.avg_days_open_since_rts - 7.0).abs() < f64::EPSILON);

        assert_eq!(
            summary.by_responsability,
            vec![
                GroupCount { label: "Hub".into(), count: 2 },
                GroupCount { label: "(blank)".into(), count: 1 },
                GroupCount { label: "Carrier".into(), count: 1 },
            ]
        );
        assert_eq!(summary.by_station[0], GroupCount { label: "SP-CJ".into(), count: 2 });
    }

    #[test]
    fn test_summary_of_nothing() {
        let empty: [ShipmentRecord; 0] = [];
        let summary = Summary::from_records(&empty);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_days_stuck, 0.0);
        assert_eq!(summary.max_days_stuck, 0);
        assert!(summary.by_station.is_empty());
    }

    #[test]
    fn test_summary_from_filtered_refs() {
        let data = sample();
        let filter = ShipmentFilter {
            status: Some("returning".into()),
            ..Default::default()
        };
        let hits = filter.apply(&data);
        let summary = Summary::from_records(hits.iter().copied());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_status.len(), 1);
    }

    #[test]
    fn test_filter_options_are_sorted_and_distinct() {
        let options = FilterOptions::from_records(&sample());
        assert_eq!(options.stations, vec!["RJ-01", "SP-CJ"]);
        assert_eq!(options.responsabilities, vec!["Carrier", "Hub"]);
        assert_eq!(options.agings, vec!["0-5 dias", "6-10 dias"]);
    }

    #[test]
    fn test_narrative_report_mentions_headlines() {
        let summary = Summary::from_records(&sample());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let report = narrative_report(&summary, at);
        assert!(report.starts_with("RTS Shipment Report\nGenerated 2024-05-01 12:30 UTC"));
        assert!(report.contains("4 shipments"));
        assert!(report.contains("owned by Hub with 2 shipments"));
        assert!(report.contains("Station SP-CJ"));
        assert!(report.contains("  - 0-5 dias: 2 (50.0%)"));
    }

    #[test]
    fn test_narrative_report_empty() {
        let empty: Vec<ShipmentRecord> = Vec::new();
        let summary = Summary::from_records(&empty);
        let report = narrative_report(&summary, Utc::now());
        assert!(report.contains("No shipments match"));
    }
}
