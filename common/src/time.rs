//! Time helpers (always UTC).

use chrono::{DateTime, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Build a timestamp from unix epoch seconds, if representable.
pub fn from_unix_seconds(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unix_seconds() {
        let ts = from_unix_seconds(1_700_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }
}
