use chrono::{DateTime, Utc};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Weight given to items whose publish time is unknown, in hundredths.
pub const STALE_WEIGHT_CENTI: u64 = 20;

/// Step-function recency weight in hundredths, `(0, 100]`.
///
/// Thresholds are hours of age: >24h 20, >12h 40, >6h 70, otherwise 100.
/// Items dated in the future count as fresh; undated items as fully stale.
pub fn time_weight_centi(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    let Some(published_at) = published_at else {
        return STALE_WEIGHT_CENTI;
    };
    let hours = (now - published_at).num_milliseconds() as f64 / MS_PER_HOUR;

    if hours > 24.0 {
        STALE_WEIGHT_CENTI
    } else if hours > 12.0 {
        40
    } else if hours > 6.0 {
        70
    } else {
        100
    }
}
