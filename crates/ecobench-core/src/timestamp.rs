//! Timestamp parsing and second-level flooring.
//!
//! Two independently sampled captures rarely land on the same instant; their
//! readings usually differ by a few milliseconds. Flooring both sides to the
//! whole second gives them a common join key.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound};

/// Naive formats tried in order after RFC 3339 and offset-bearing forms.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Offset-bearing formats that RFC 3339 parsing rejects (space separator).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse a timestamp cell into a naive UTC date-time.
///
/// Accepted inputs:
/// - RFC 3339 with an offset (`2025-03-10T12:00:00.003+01:00`), converted to UTC
/// - naive date-times with `T` or space separator and optional fraction
/// - a bare date (`2025-03-10`), read as midnight
/// - an integer, read as Unix epoch milliseconds
///
/// Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(ms) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }
    None
}

/// Drop sub-second precision, rounding down.
///
/// Never rounds to nearest: `12:00:00.999` floors to `12:00:00`.
pub fn floor_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.trunc_subsecs(0)
}
