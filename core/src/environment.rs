//! Injected dependencies for the functional core.
//!
//! Only time is abstracted today. The business runs on República Dominicana
//! time (UTC−4, no DST); ticket dates and times default to that wall clock,
//! while storage timestamps stay in UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Offset of the business timezone from UTC, in hours.
pub const BUSINESS_UTC_OFFSET_HOURS: i32 = -4;

/// Clock trait - abstracts time for testability.
///
/// Production uses [`SystemClock`]; tests use the fixed clock from
/// `despacho-testing` so ticket defaults are deterministic.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Project an instant onto the business wall clock, yielding the local
/// date and minute-precision time a ticket is stamped with.
#[must_use]
pub fn business_date_time(now: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
    // The constant offset is always in range; fall back to UTC if it ever
    // is not, rather than failing a ticket over a timestamp.
    let Some(offset) = FixedOffset::east_opt(BUSINESS_UTC_OFFSET_HOURS * 3600) else {
        return (now.date_naive(), now.time());
    };
    let local = now.with_timezone(&offset);
    let time = local.time();
    let minute_precision = NaiveTime::from_hms_opt(
        chrono::Timelike::hour(&time),
        chrono::Timelike::minute(&time),
        0,
    )
    .unwrap_or(time);
    (local.date_naive(), minute_precision)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn business_time_is_four_hours_behind_utc() {
        let utc = DateTime::parse_from_rfc3339("2025-06-01T02:30:45Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let (date, time) = business_date_time(utc);
        // 02:30 UTC is 22:30 the previous day in Santo Domingo.
        assert_eq!(date.to_string(), "2025-05-31");
        assert_eq!(time.to_string(), "22:30:00");
    }

    #[test]
    fn seconds_are_dropped() {
        let utc = DateTime::parse_from_rfc3339("2025-06-01T12:15:59Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let (_, time) = business_date_time(utc);
        assert_eq!(time.to_string(), "08:15:00");
    }
}
