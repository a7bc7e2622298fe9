//! Lenient timestamp parsing for backend date-times.
//!
//! The backend emits naive local times either space- or `T`-separated,
//! sometimes with fractional seconds, and occasionally as a full RFC 3339
//! instant. Everything is normalized to [`NaiveDateTime`] in the city's
//! local time.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, de};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a backend timestamp.
///
/// A bare date (`2024-01-15`) is treated as midnight.
#[must_use]
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Formats an instant the way the backend expects it in query strings.
#[must_use]
pub fn format(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `serde` adapter for required timestamp fields.
///
/// # Errors
///
/// Returns a deserialization error if the value is not a string or does
/// not match any accepted format.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

/// `serde` adapter for optional timestamp fields. `null` maps to `None`.
///
/// # Errors
///
/// Returns a deserialization error if a present value does not match any
/// accepted format.
pub fn deserialize_option<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|raw| {
        parse(&raw).ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {raw}")))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn accepts_space_and_t_separators() {
        assert_eq!(parse("2018-01-01 00:08:00"), Some(at(2018, 1, 1, 0, 8, 0)));
        assert_eq!(parse("2018-01-01T18:00:00"), Some(at(2018, 1, 1, 18, 0, 0)));
        assert_eq!(
            parse("2018-01-01T18:00:00.123456"),
            Some(at(2018, 1, 1, 18, 0, 0) + chrono::TimeDelta::microseconds(123_456))
        );
    }

    #[test]
    fn accepts_rfc3339_keeping_local_wall_time() {
        assert_eq!(
            parse("2024-05-02T09:30:00+10:00"),
            Some(at(2024, 5, 2, 9, 30, 0))
        );
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(parse("2024-05-02"), Some(at(2024, 5, 2, 0, 0, 0)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn formats_for_query_strings() {
        assert_eq!(format(at(2024, 5, 2, 23, 59, 59)), "2024-05-02T23:59:59");
    }
}
