use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Layout used when writing timestamps back out. Fractional seconds are
/// only printed when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a timestamp cell into a timezone-naive [`NaiveDateTime`].
///
/// Offsets are stripped, not converted: `2024-01-15T10:00:00+05:00` becomes
/// `2024-01-15 10:00:00`. Returns `None` for empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // RFC 3339 with `Z` or a numeric offset.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    // Space-separated date and time with an offset, e.g. pandas' default
    // `2024-01-15 10:00:00+00:00`.
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(midnight(date));
        }
    }

    debug!("could not parse timestamp \"{}\"", s);
    None
}

/// Parse a user-supplied calendar date (`YYYY-MM-DD` and friends).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| DashboardError::TimestampParse(s.to_string()))
}

/// The start of `date`.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Year-month bucket key, e.g. `"2024-01"`. Sorts chronologically.
pub fn month_key(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m").to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_rfc3339_strips_offset_without_converting() {
        assert_eq!(
            parse_timestamp("2024-01-15T10:00:00+05:00"),
            Some(dt("2024-01-15 10:00:00"))
        );
        assert_eq!(
            parse_timestamp("2024-01-15T23:30:00Z"),
            Some(dt("2024-01-15 23:30:00"))
        );
    }

    #[test]
    fn test_parse_space_separated_with_offset() {
        assert_eq!(
            parse_timestamp("2024-03-01 08:15:00+00:00"),
            Some(dt("2024-03-01 08:15:00"))
        );
    }

    #[test]
    fn test_parse_naive_formats() {
        assert_eq!(
            parse_timestamp("2024-01-15 10:00:00"),
            Some(dt("2024-01-15 10:00:00"))
        );
        assert_eq!(
            parse_timestamp("2024-01-15T10:00:00.250"),
            Some(dt("2024-01-15 10:00:00") + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp("2024-01-15"), Some(dt("2024-01-15 00:00:00")));
    }

    #[test]
    fn test_parse_invalid_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(
            parse_date("yesterday"),
            Err(DashboardError::TimestampParse(_))
        ));
    }

    #[test]
    fn test_month_key_sorts_chronologically() {
        let mut keys = vec![
            month_key(dt("2024-11-02 00:00:00")),
            month_key(dt("2023-12-31 23:59:59")),
            month_key(dt("2024-02-10 12:00:00")),
        ];
        keys.sort();
        assert_eq!(keys, vec!["2023-12", "2024-02", "2024-11"]);
    }

    #[test]
    fn test_format_timestamp_round_trips() {
        let ts = dt("2024-05-06 07:08:09");
        assert_eq!(format_timestamp(ts), "2024-05-06 07:08:09");
        assert_eq!(parse_timestamp(&format_timestamp(ts)), Some(ts));
    }

    #[test]
    fn test_format_timestamp_keeps_subseconds() {
        let ts = dt("2024-01-15 10:00:00") + chrono::Duration::milliseconds(250);
        assert_eq!(format_timestamp(ts), "2024-01-15 10:00:00.250");
        assert_eq!(parse_timestamp(&format_timestamp(ts)), Some(ts));
    }
}
