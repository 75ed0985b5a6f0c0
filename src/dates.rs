//! Timestamp helpers.
//!
//! The backend serializes its timestamps without an offset
//! (`2024-03-01T10:20:30.123456`) even though they are recorded in UTC.
//! Parsing such a value as local time shifts every date by the user's
//! offset, so naive timestamps are always read as UTC here.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::TodoError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const DISPLAY_FORMAT: &str = "%b %-d, %Y %H:%M";

/// Parse a timestamp sent by the backend
pub fn parse_server_timestamp(raw: &str) -> Result<DateTime<Utc>, TodoError> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(TodoError::Decode(format!("Invalid timestamp '{}'", raw)))
}

/// Formats `ts` as `Mar 1, 2024 10:20` in the given zone
pub fn format_timestamp<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

pub fn format_local(ts: &DateTime<Utc>) -> String {
    format_timestamp(ts, &chrono::Local)
}

/// Human readable age of `ts` relative to `now`.
///
/// Anything older than 30 days is shown as an absolute date in `tz`.
pub fn relative_time<Tz>(ts: &DateTime<Utc>, now: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let age = *now - *ts;

    if age < Duration::minutes(1) {
        return String::from("just now");
    }

    if age < Duration::hours(1) {
        return plural(age.num_minutes(), "minute");
    }

    if age < Duration::days(1) {
        return plural(age.num_hours(), "hour");
    }

    if age < Duration::days(30) {
        return plural(age.num_days(), "day");
    }

    format_timestamp(ts, tz)
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_server_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_server_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod dates_test {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_server_timestamp("2024-03-01T10:20:30").unwrap();
        assert_eq!(ts, utc(2024, 3, 1, 10, 20, 30));
    }

    #[test]
    fn test_fractional_and_space_separated() {
        let ts = parse_server_timestamp("2024-03-01T10:20:30.123456").unwrap();
        assert_eq!(ts.timestamp(), utc(2024, 3, 1, 10, 20, 30).timestamp());

        let ts = parse_server_timestamp("2024-03-01 10:20:30").unwrap();
        assert_eq!(ts, utc(2024, 3, 1, 10, 20, 30));
    }

    #[test]
    fn test_offset_is_honoured() {
        let ts = parse_server_timestamp("2024-03-01T12:20:30+02:00").unwrap();
        assert_eq!(ts, utc(2024, 3, 1, 10, 20, 30));

        let ts = parse_server_timestamp("2024-03-01T10:20:30Z").unwrap();
        assert_eq!(ts, utc(2024, 3, 1, 10, 20, 30));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_server_timestamp("").is_err());
        assert!(parse_server_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_format_in_zone() {
        let ts = utc(2024, 3, 1, 10, 5, 0);
        assert_eq!(format_timestamp(&ts, &Utc), "Mar 1, 2024 10:05");

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_timestamp(&ts, &plus_two), "Mar 1, 2024 12:05");
    }

    #[test]
    fn test_relative_time() {
        let now = utc(2024, 3, 10, 12, 0, 0);

        assert_eq!(relative_time(&utc(2024, 3, 10, 11, 59, 30), &now, &Utc), "just now");
        assert_eq!(relative_time(&utc(2024, 3, 10, 11, 59, 0), &now, &Utc), "1 minute ago");
        assert_eq!(relative_time(&utc(2024, 3, 10, 11, 15, 0), &now, &Utc), "45 minutes ago");
        assert_eq!(relative_time(&utc(2024, 3, 10, 9, 0, 0), &now, &Utc), "3 hours ago");
        assert_eq!(relative_time(&utc(2024, 3, 8, 12, 0, 0), &now, &Utc), "2 days ago");
        assert_eq!(
            relative_time(&utc(2024, 1, 2, 8, 30, 0), &now, &Utc),
            "Jan 2, 2024 08:30"
        );
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = utc(2024, 3, 10, 12, 0, 0);
        assert_eq!(relative_time(&utc(2024, 3, 10, 12, 5, 0), &now, &Utc), "just now");
    }
}
