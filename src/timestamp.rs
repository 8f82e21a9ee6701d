use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::DecodeError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert a device timestamp to an RFC 3339 UTC string with millisecond
/// precision, e.g. `2021-01-01T00:00:00.000Z`.
///
/// Accepts RFC 3339 with any offset, a naive date-time taken as UTC, or
/// epoch milliseconds.
pub fn normalize_utc(raw: &str) -> Result<String, DecodeError> {
    parse_device_time(raw.trim())
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| DecodeError::Timestamp(raw.to_string()))
}

fn parse_device_time(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis = raw.parse::<i64>().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
