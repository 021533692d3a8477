//! Timestamps, clocks and expiry arithmetic.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Build artifacts are kept by
//! the backend for a fixed number of days after `end_build_time`; countdowns
//! show the time left until that expiry.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TypeError;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Default number of days the backend retains a finished build.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Naive layouts the backend has been seen to emit, interpreted as local time.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the epoch yields a negative value rather than failing.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Self(i64::try_from(d.as_millis()).unwrap_or(i64::MAX)),
            Err(e) => Self(-i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX)),
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// This timestamp shifted forward by whole days.
    pub fn saturating_add_days(&self, days: u32) -> Self {
        Self(self.0.saturating_add(i64::from(days).saturating_mul(MILLIS_PER_DAY)))
    }

    /// Signed milliseconds from `self` until `later`; negative when `later` is in the past.
    pub fn millis_until(&self, later: Timestamp) -> i64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of the current instant.
///
/// Polling loops read time through this trait so tests can drive them with a
/// deterministic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Parse a timestamp string as reported by the backend.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00+08:00`), naive date-times with a
/// `T` or space separator and optional fractional seconds (read as local
/// time), and bare dates (midnight UTC).
pub fn parse_backend_time(raw: &str) -> Result<Timestamp, TypeError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp(dt.timestamp_millis()));
    }
    for layout in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| Timestamp(dt.timestamp_millis()))
                .ok_or_else(|| TypeError::InvalidTimestamp(raw.to_string()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Timestamp(midnight.and_utc().timestamp_millis()));
        }
    }
    Err(TypeError::InvalidTimestamp(raw.to_string()))
}

/// Expiry instant of a build that finished at `end_build_time`.
///
/// Builds that have not finished (absent or empty end time) or whose end
/// time cannot be parsed have no expiry.
pub fn expiry_for(end_build_time: Option<&str>, retention_days: u32) -> Option<Timestamp> {
    let raw = end_build_time.map(str::trim).filter(|s| !s.is_empty())?;
    parse_backend_time(raw)
        .ok()
        .map(|end| end.saturating_add_days(retention_days))
}

/// Milliseconds left until `expiry`, clamped at zero. No expiry means nothing left.
pub fn remaining_ms(expiry: Option<Timestamp>, now: Timestamp) -> i64 {
    expiry.map_or(0, |at| now.millis_until(at).max(0))
}

/// Share of the retention window still left, in `[0.0, 1.0]`.
pub fn retention_fraction(remaining_ms: i64, retention_days: u32) -> f64 {
    let total = i64::from(retention_days) * MILLIS_PER_DAY;
    if remaining_ms <= 0 || total <= 0 {
        return 0.0;
    }
    (remaining_ms as f64 / total as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_backend_time("2024-05-01T10:00:00+08:00").unwrap();
        let utc = parse_backend_time("2024-05-01T02:00:00Z").unwrap();
        assert_eq!(ts, utc);
    }

    #[test]
    fn parses_naive_as_local_time() {
        let naive = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(
            parse_backend_time("2024-05-01 10:00:00").unwrap().as_millis(),
            expected
        );
        assert_eq!(
            parse_backend_time("2024-05-01T10:00:00").unwrap().as_millis(),
            expected
        );
        assert_eq!(
            parse_backend_time("2024-05-01T10:00:00.250").unwrap().as_millis(),
            expected + 250
        );
    }

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let ts = parse_backend_time("1970-01-02").unwrap();
        assert_eq!(ts.as_millis(), MILLIS_PER_DAY);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_backend_time("yesterday"),
            Err(TypeError::InvalidTimestamp("yesterday".into()))
        );
    }

    #[test]
    fn expiry_adds_retention_days() {
        let expiry = expiry_for(Some("2024-01-01T00:00:00Z"), 30).unwrap();
        let end = parse_backend_time("2024-01-31T00:00:00Z").unwrap();
        assert_eq!(expiry, end);
    }

    #[test]
    fn unfinished_build_has_no_expiry() {
        assert_eq!(expiry_for(None, 30), None);
        assert_eq!(expiry_for(Some(""), 30), None);
        assert_eq!(expiry_for(Some("   "), 30), None);
        assert_eq!(expiry_for(Some("not a date"), 30), None);
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let expiry = Timestamp::from_millis(10_000);
        assert_eq!(remaining_ms(Some(expiry), Timestamp::from_millis(4_000)), 6_000);
        assert_eq!(remaining_ms(Some(expiry), Timestamp::from_millis(10_000)), 0);
        assert_eq!(remaining_ms(Some(expiry), Timestamp::from_millis(20_000)), 0);
        assert_eq!(remaining_ms(None, Timestamp::from_millis(0)), 0);
    }

    #[test]
    fn retention_fraction_bounds() {
        assert_eq!(retention_fraction(0, 30), 0.0);
        assert_eq!(retention_fraction(-5, 30), 0.0);
        assert_eq!(retention_fraction(15 * MILLIS_PER_DAY, 30), 0.5);
        assert_eq!(retention_fraction(40 * MILLIS_PER_DAY, 30), 1.0);
        assert_eq!(retention_fraction(1_000, 0), 0.0);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
