//! Deterministic clocks for tests.

use chrono::{DateTime, Utc};
use despacho_core::environment::Clock;
use std::sync::{Arc, Mutex};

/// Fixed clock for deterministic tests.
///
/// Always returns the same time until advanced, making ticket date/time
/// defaults and session expiry reproducible.
///
/// # Example
///
/// ```
/// use despacho_testing::clock::FixedClock;
/// use despacho_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a fixed clock at the given instant.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Move the clock forward (or back, with a negative duration).
    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.time.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
            .lock()
            .map_or_else(|_| Utc::now(), |guard| *guard)
    }
}

/// Default test clock: 2025-01-01 12:00:00 UTC (08:00 business time).
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which cannot happen.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable_until_advanced() {
        let clock = test_clock();
        let before = clock.now();
        assert_eq!(before, clock.now());

        clock.advance(chrono::Duration::hours(2));
        assert_eq!(clock.now() - before, chrono::Duration::hours(2));
    }
}
