//! Time helpers shared across the engine.

use chrono::{DateTime, Utc};

/// Current time as seconds since the epoch.
pub(crate) fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Render an epoch timestamp as an ISO-8601 string.
///
/// Out-of-range timestamps fall back to the current time rather than
/// producing an empty attribute.
pub(crate) fn iso8601(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_known_instant() {
        assert_eq!(iso8601(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(iso8601(1_700_000_000), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_now_epoch_is_positive() {
        assert!(now_epoch() > 1_600_000_000);
    }
}
