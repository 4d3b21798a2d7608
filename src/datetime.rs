//! Date/time formatting for ChatZone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Default display format.
pub const DEFAULT_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Format epoch milliseconds in the given timezone.
///
/// Unknown timezones fall back to UTC; out-of-range instants are
/// rendered as the raw number.
///
/// # Examples
///
/// ```
/// use chatzone::datetime::format_millis;
///
/// assert_eq!(format_millis(0, "UTC", "%Y-%m-%d %H:%M"), "1970-01-01 00:00");
/// assert_eq!(format_millis(0, "Asia/Tokyo", "%H:%M"), "09:00");
/// ```
pub fn format_millis(millis: i64, timezone: &str, format: &str) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) => format_utc(&dt, timezone, format),
        None => millis.to_string(),
    }
}

/// Format a UTC instant in the given timezone.
pub fn format_utc(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(format).to_string(),
        Err(_) => dt.format(format).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_millis_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap();
        assert_eq!(
            format_millis(dt.timestamp_millis(), "UTC", DEFAULT_FORMAT),
            "2024/03/01 12:15"
        );
    }

    #[test]
    fn test_format_millis_timezone() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap();
        assert_eq!(
            format_millis(dt.timestamp_millis(), "Europe/Paris", DEFAULT_FORMAT),
            "2024/03/01 13:15"
        );
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap();
        assert_eq!(format_utc(&dt, "Nowhere/City", "%H:%M"), "12:15");
    }

    #[test]
    fn test_out_of_range_millis() {
        assert_eq!(format_millis(i64::MAX, "UTC", DEFAULT_FORMAT), i64::MAX.to_string());
    }
}
