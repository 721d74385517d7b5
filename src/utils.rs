// Utility functions
use chrono::{DateTime, NaiveDate};

/// Parses a `YYYY-MM-DD` string into a `NaiveDate`, if possible.
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Parses either a plain date or an RFC 3339 timestamp, keeping only the date part.
pub fn parse_date_lenient(date_str: &str) -> Option<NaiveDate> {
    parse_date(date_str).or_else(|| {
        DateTime::parse_from_rfc3339(date_str.trim())
            .ok()
            .map(|dt| dt.date_naive())
    })
}

/// UTC calendar date of a Unix timestamp in seconds.
pub fn date_from_unix(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
