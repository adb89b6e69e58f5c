//! Time-bucketed unlock series for the chart: a sparse monthly view over the
//! union of every monitored wallet's events, and a dense daily view for one
//! selected month. Navigation state is an explicit value the caller threads
//! through `render`/`drill_down`/`back`; nothing here is ambient.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::ThawEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    Monthly,
    Daily,
}

/// Two-level navigation state. `selected_month` is a `"YYYY-MM"` key and is
/// set exactly when `mode` is `Daily`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartState {
    pub mode: ChartMode,
    pub selected_month: Option<String>,
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            mode: ChartMode::Monthly,
            selected_month: None,
        }
    }
}

impl ChartState {
    pub fn monthly() -> Self {
        Self::default()
    }

    pub fn daily(month: impl Into<String>) -> Self {
        Self {
            mode: ChartMode::Daily,
            selected_month: Some(month.into()),
        }
    }
}

/// Chart-ready series. `keys` are the canonical bucket keys in the same order
/// as `labels`/`values`, so a selection-by-index maps straight to a key
/// without recomputing the bucketing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSeries {
    pub keys: Vec<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub show_back: bool,
}

/// True for a canonical zero-padded `"YYYY-MM"` key.
pub fn is_month_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && s[..4].bytes().all(|b| b.is_ascii_digit())
        && s[5..].bytes().all(|b| b.is_ascii_digit())
}

pub fn render(events: &[ThawEvent], state: &ChartState) -> ChartSeries {
    match (state.mode, state.selected_month.as_deref()) {
        (ChartMode::Daily, Some(month)) => daily_series(events, month),
        // Daily without a month is unreachable through drill_down/back.
        _ => monthly_series(events),
    }
}

/// Sparse monthly series: only months with at least one event appear.
/// Bucketing is by date only; redemption status is irrelevant here.
pub fn monthly_series(events: &[ThawEvent]) -> ChartSeries {
    let buckets = monthly_buckets(events);
    let mut series = ChartSeries::default();
    for (key, value) in buckets {
        series.labels.push(month_label(&key));
        series.keys.push(key);
        series.values.push(value);
    }
    series
}

/// Dense daily series for one month: every calendar day pre-seeded with 0,
/// events outside the month ignored.
pub fn daily_series(events: &[ThawEvent], month: &str) -> ChartSeries {
    let mut series = ChartSeries {
        show_back: true,
        ..ChartSeries::default()
    };
    let Some(days) = days_in_month(month) else {
        return series;
    };

    let mut buckets: BTreeMap<String, f64> =
        (1..=days).map(|d| (format!("{month}-{d:02}"), 0.0)).collect();
    for event in events {
        let Some(date) = event.thaw_date() else {
            continue;
        };
        if date.format("%Y-%m").to_string() != month {
            continue;
        }
        let key = date.format("%Y-%m-%d").to_string();
        *buckets.entry(key).or_insert(0.0) += event.display_amount();
    }

    for (key, value) in buckets {
        series.labels.push(day_label(&key));
        series.keys.push(key);
        series.values.push(value);
    }
    series
}

/// Transition from a monthly-bucket selection at sorted `index` into daily
/// mode. The index is resolved against the same deterministic bucketing that
/// produced the displayed series, so positional correspondence holds. A
/// selection while already in daily mode, or an out-of-range index, leaves
/// the state unchanged.
pub fn drill_down(events: &[ThawEvent], state: &ChartState, index: usize) -> ChartState {
    if state.mode != ChartMode::Monthly {
        return state.clone();
    }
    let keys: Vec<String> = monthly_buckets(events).into_keys().collect();
    match keys.get(index) {
        Some(key) => ChartState::daily(key.clone()),
        None => state.clone(),
    }
}

pub fn back() -> ChartState {
    ChartState::monthly()
}

/// Zero-padded month keys sort lexicographically in chronological order, so
/// a BTreeMap gives the display order for free.
fn monthly_buckets(events: &[ThawEvent]) -> BTreeMap<String, f64> {
    let mut buckets = BTreeMap::new();
    for event in events {
        let Some(date) = event.thaw_date() else {
            continue;
        };
        let key = date.format("%Y-%m").to_string();
        *buckets.entry(key).or_insert(0.0) += event.display_amount();
    }
    buckets
}

fn days_in_month(month: &str) -> Option<u32> {
    if !is_month_key(month) {
        return None;
    }
    let year: i32 = month[..4].parse().ok()?;
    let m: u32 = month[5..].parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, m, 1)?;
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, m + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .map_or_else(|_| key.to_string(), |d| d.format("%b %Y").to_string())
}

fn day_label(key: &str) -> String {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_or_else(|_| key.to_string(), |d| d.format("%d %b").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(amount: &str, start: &str, tx: Option<&str>) -> ThawEvent {
        ThawEvent {
            amount: Some(amount.to_string()),
            thawing_period_start: start.to_string(),
            transaction_id: tx.map(str::to_string),
        }
    }

    fn two_month_events() -> Vec<ThawEvent> {
        vec![
            event("2000000", "2024-03-10", None),
            event("4000000", "2024-05-20", None),
        ]
    }

    #[test]
    fn test_monthly_series_sorted_and_sparse() {
        let series = monthly_series(&two_month_events());
        assert_eq!(series.keys, vec!["2024-03", "2024-05"]);
        assert_eq!(series.values, vec![2.0, 4.0]);
        assert_eq!(series.labels, vec!["Mar 2024", "May 2024"]);
        assert!(!series.show_back);
    }

    #[test]
    fn test_monthly_series_sums_within_month() {
        let events = vec![
            event("1000000", "2024-03-01", None),
            event("2000000", "2024-03-31", None),
        ];
        let series = monthly_series(&events);
        assert_eq!(series.keys, vec!["2024-03"]);
        assert_eq!(series.values, vec![3.0]);
    }

    #[test]
    fn test_monthly_bucketing_ignores_redemption_status() {
        let events = vec![
            event("1000000", "2024-03-01", Some("tx1")),
            event("2000000", "2024-03-15", None),
        ];
        let series = monthly_series(&events);
        assert_eq!(series.values, vec![3.0]);
    }

    #[test]
    fn test_monthly_skips_unparseable_dates() {
        let events = vec![
            event("1000000", "2024-03-01", None),
            event("9000000", "whenever", None),
        ];
        let series = monthly_series(&events);
        assert_eq!(series.keys, vec!["2024-03"]);
        assert_eq!(series.values, vec![1.0]);
    }

    #[test]
    fn test_daily_series_is_dense_for_whole_month() {
        let series = daily_series(&two_month_events(), "2024-05");
        assert_eq!(series.keys.len(), 31);
        assert!(series.keys.iter().all(|k| k.starts_with("2024-05-")));
        assert_eq!(series.keys.first().map(String::as_str), Some("2024-05-01"));
        assert_eq!(series.keys.last().map(String::as_str), Some("2024-05-31"));
        assert!(series.show_back);

        // The event day carries its amount, all other days are zero.
        let day_index = series.keys.iter().position(|k| k == "2024-05-20").unwrap();
        assert_eq!(series.values[day_index], 4.0);
        let sum: f64 = series.values.iter().sum();
        assert_eq!(sum, 4.0);
    }

    #[test]
    fn test_daily_series_ignores_other_months() {
        let series = daily_series(&two_month_events(), "2024-03");
        assert_eq!(series.keys.len(), 31);
        let sum: f64 = series.values.iter().sum();
        assert_eq!(sum, 2.0);
    }

    #[test]
    fn test_daily_series_february_leap_year() {
        let series = daily_series(&[], "2024-02");
        assert_eq!(series.keys.len(), 29);
        let series = daily_series(&[], "2023-02");
        assert_eq!(series.keys.len(), 28);
    }

    #[test]
    fn test_daily_series_invalid_month_is_empty() {
        let series = daily_series(&two_month_events(), "2024-13");
        assert!(series.keys.is_empty());
        assert!(series.show_back);
        let series = daily_series(&two_month_events(), "not-a-month");
        assert!(series.keys.is_empty());
    }

    #[test]
    fn test_drill_down_maps_sorted_index_to_month_key() {
        let events = two_month_events();
        let state = ChartState::monthly();
        let next = drill_down(&events, &state, 1);
        assert_eq!(next, ChartState::daily("2024-05"));

        let series = render(&events, &next);
        assert_eq!(series.keys.len(), 31);
        assert!(series.show_back);
    }

    #[test]
    fn test_drill_down_out_of_range_is_noop() {
        let events = two_month_events();
        let state = ChartState::monthly();
        assert_eq!(drill_down(&events, &state, 7), state);
    }

    #[test]
    fn test_drill_down_in_daily_mode_is_noop() {
        let events = two_month_events();
        let state = ChartState::daily("2024-03");
        assert_eq!(drill_down(&events, &state, 0), state);
    }

    #[test]
    fn test_back_resets_to_monthly() {
        assert_eq!(back(), ChartState::monthly());
    }

    #[test]
    fn test_render_follows_state() {
        let events = two_month_events();
        let monthly = render(&events, &ChartState::monthly());
        assert!(!monthly.show_back);
        assert_eq!(monthly.keys, vec!["2024-03", "2024-05"]);

        let daily = render(&events, &ChartState::daily("2024-05"));
        assert!(daily.show_back);
        assert_eq!(daily.keys.len(), 31);
    }

    #[test]
    fn test_monthly_total_matches_event_total() {
        let events = vec![
            event("1000000", "2024-01-05", Some("tx")),
            event("2000000", "2024-02-05", None),
            event("3000000", "2024-02-20", None),
            event("4000000", "2025-12-31", None),
        ];
        let series = monthly_series(&events);
        let chart_sum: f64 = series.values.iter().sum();
        let event_sum: f64 = events.iter().map(ThawEvent::display_amount).sum();
        assert_eq!(chart_sum, event_sum);
    }

    #[test]
    fn test_is_month_key() {
        assert!(is_month_key("2024-05"));
        assert!(!is_month_key("2024-5"));
        assert!(!is_month_key("2024-05-01"));
        assert!(!is_month_key("abcd-ef"));
    }
}
