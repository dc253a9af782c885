//! Timestamp parsing for changelog text timestamps.
//!
//! Timestamps travel as text end to end. The service rewrites every input
//! once, at creation, into [`to_utc_text`] form; after that the text is
//! passed through untouched and orders the same as the instant it names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse an ISO-8601 timestamp in any of the accepted shapes.
///
/// Accepted: RFC 3339 (`2024-01-01T00:00:00Z`, with offset or fraction),
/// naive date-time (`2024-01-01T00:00:00`, `2024-01-01 00:00:00`, read as UTC)
/// and plain dates (`2024-01-01`, midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`: fixed width, UTC, millisecond precision.
pub fn to_utc_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Milliseconds since the Unix epoch, used as the sorted-index score.
pub fn epoch_millis(value: &str) -> Option<i64> {
    parse_timestamp(value).map(|dt| dt.timestamp_millis())
}

/// Current time rendered the way every backend renders `createdAt`.
pub fn now_iso() -> String {
    to_utc_text(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_timestamp(value: &str) -> Option<String> {
        parse_timestamp(value).map(to_utc_text)
    }

    #[test]
    fn test_parse_accepted_shapes() {
        let midnight = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2024-01-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T01:00:00+01:00"), Some(midnight));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }

    #[test]
    fn test_epoch_millis_orders_like_time() {
        let jan = epoch_millis("2024-01-01").unwrap();
        let feb = epoch_millis("2024-02-01T00:00:00Z").unwrap();
        assert!(feb > jan);
        assert_eq!(epoch_millis("1970-01-01T00:00:00Z"), Some(0));
    }

    #[test]
    fn test_normalize_to_fixed_width_utc() {
        assert_eq!(
            normalize_timestamp("2024-01-01").as_deref(),
            Some("2024-01-01T00:00:00.000Z")
        );
        assert_eq!(
            normalize_timestamp("2024-01-01T10:00:00+09:00").as_deref(),
            Some("2024-01-01T01:00:00.000Z")
        );
        assert_eq!(
            normalize_timestamp("2024-01-01 12:00:00").as_deref(),
            Some("2024-01-01T12:00:00.000Z")
        );
        assert_eq!(
            normalize_timestamp("2024-01-01T00:00:01.5Z").as_deref(),
            Some("2024-01-01T00:00:01.500Z")
        );
        assert_eq!(normalize_timestamp("soon"), None);
    }

    #[test]
    fn test_normalized_text_orders_like_time() {
        let shapes = [
            "2024-01-01 12:00:00",
            "2024-01-01T06:00:00Z",
            "2024-01-01T10:00:00+09:00",
            "2024-01-01",
            "2024-01-01T06:00:00.250Z",
        ];
        for a in shapes {
            for b in shapes {
                let (na, nb) = (normalize_timestamp(a).unwrap(), normalize_timestamp(b).unwrap());
                assert_eq!(
                    na.cmp(&nb),
                    parse_timestamp(a).unwrap().cmp(&parse_timestamp(b).unwrap()),
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn test_now_iso_is_parseable() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert!(parse_timestamp(&now).is_some());
    }
}
