use chrono::{DateTime, SecondsFormat, Utc};

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    rfc3339(Utc::now())
}

/// Format a timestamp as RFC 3339 UTC with fixed microsecond precision.
///
/// Every stored timestamp goes through here, so comparing two of them as
/// strings (as SQL `ORDER BY` and range filters do) agrees with comparing
/// them as instants.
pub fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_now_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_fixed_width_orders_lexically() {
        let a = rfc3339(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let b = rfc3339(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(a, "2025-03-01T09:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
