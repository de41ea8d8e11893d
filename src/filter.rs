use chrono::{Duration, NaiveDate};

use crate::models::{DateRange, NewsItem};

/// Source name that disables source filtering.
pub const ALL_SOURCES: &str = "Semua";

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub source: Option<String>,
    pub query: Option<String>,
    pub start: Option<NaiveDate>, // inclusive, UTC day
    pub end: Option<NaiveDate>,   // inclusive, UTC day
}

impl ItemFilter {
    pub fn matches(&self, item: &NewsItem) -> bool {
        if let Some(src) = self.source.as_deref() {
            if src != ALL_SOURCES && !item.source.eq_ignore_ascii_case(src) {
                return false;
            }
        }

        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            if !item.title.to_lowercase().contains(&q) && !item.description.to_lowercase().contains(&q) {
                return false;
            }
        }

        // Same as the web UI: the range only applies when both ends are set.
        if let (Some(start), Some(end)) = (self.start, self.end) {
            let Some(ts) = item.published_at else {
                return false;
            };
            let from = start.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
            let until = (end + Duration::days(1)).and_hms_opt(0, 0, 0).map(|d| d.and_utc());
            match (from, until) {
                (Some(from), Some(until)) if ts >= from && ts < until => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply<'a>(&self, items: &'a [NewsItem]) -> Vec<&'a NewsItem> {
        items.iter().filter(|it| self.matches(it)).collect()
    }
}

/// First and last publish day across dated items.
pub fn date_range(items: &[NewsItem]) -> Option<DateRange> {
    let days = items.iter().filter_map(|it| it.published_at).map(|ts| ts.date_naive());
    let (min, max) = days.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    Some(DateRange {
        min: min.format("%Y-%m-%d").to_string(),
        max: max.format("%Y-%m-%d").to_string(),
    })
}
