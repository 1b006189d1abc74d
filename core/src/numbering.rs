//! The Number Allocator.
//!
//! Produces the next dispatch display number such that numbers are unique,
//! and non-decreasing relative to both prior issuances and the configured
//! floor (`dispatch_start_number`).
//!
//! The allocator is a pure function over two snapshot inputs:
//!
//! - the numeric value of the display number on the **most recently created**
//!   ticket (by insertion order, not by numeric value; see below), and
//! - the configured floor.
//!
//! ```text
//! last absent:   next = floor
//! last present:  next = max(last + 1, floor)
//! ```
//!
//! Raising the floor lets an administrator fast-forward the sequence (for
//! example, to line up with a paper ticket book); it takes effect on the very
//! next allocation. Lowering it is a no-op once a higher number has been
//! issued: the `max` makes the floor a lower bound only.
//!
//! The "last issued" input is derived from the ledger tail by insertion
//! order. An administrative renumbering of an *older* ticket does not
//! re-derive any global maximum: only the newest row feeds the next
//! allocation. Callers that want different semantics must change the
//! snapshot they pass in, not this function.
//!
//! Serialization of concurrent allocations is the storage layer's job; this
//! module holds no state between invocations.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display numbers are zero-padded to this many digits.
///
/// Values that need more digits render at their natural width; padding is
/// skipped, never truncated.
pub const DISPLAY_WIDTH: usize = 7;

/// Floor used when the setting is absent or unreadable.
pub const DEFAULT_START_NUMBER: u64 = 1;

/// Compute the next number to issue.
///
/// `last_issued` is the numeric value of the most recently created ticket's
/// display number, or `None` when the ledger is empty. `start_number` is the
/// configured floor.
#[must_use]
pub const fn next_number(last_issued: Option<u64>, start_number: u64) -> u64 {
    match last_issued {
        None => start_number,
        Some(last) => {
            let candidate = last.saturating_add(1);
            if candidate > start_number {
                candidate
            } else {
                start_number
            }
        }
    }
}

/// A dispatch display number: the human-facing, zero-padded sequential
/// identifier printed on physical tickets.
///
/// Distinct from the internal storage id. Formats as a fixed-width decimal
/// string (`0000042`); values past [`DISPLAY_WIDTH`] digits grow naturally.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DispatchNumber(u64);

impl DispatchNumber {
    /// Wrap a raw numeric value.
    #[must_use]
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parse a display string strictly: digits only, non-empty.
    ///
    /// Used to validate caller-supplied numbers (the administrative
    /// override accepts arbitrary strings and does *not* go through here).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDispatchNumber`] if the input is empty,
    /// contains non-digit characters, or overflows.
    pub fn parse(display: &str) -> Result<Self, DomainError> {
        let trimmed = display.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidDispatchNumber {
                value: display.to_string(),
            });
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidDispatchNumber {
                value: display.to_string(),
            })
    }
}

impl fmt::Display for DispatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = DISPLAY_WIDTH)
    }
}

/// Lenient numeric reading of a stored display number, mirroring how the
/// ledger tail is interpreted: leading digits count, anything else is zero.
///
/// The ledger accepts administratively overridden values that need not be
/// numeric at all (`"A-123"`, `""`). Allocation still has to make progress
/// from such a tail, so unparseable values read as 0 and the sequence
/// restarts from the floor.
#[must_use]
pub fn numeric_value(display: &str) -> u64 {
    let digits: String = display
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_ledger_uses_floor_of_one() {
        let next = next_number(None, 1);
        assert_eq!(DispatchNumber::from_value(next).to_string(), "0000001");
    }

    #[test]
    fn empty_ledger_uses_configured_floor() {
        let next = next_number(None, 5000);
        assert_eq!(DispatchNumber::from_value(next).to_string(), "0005000");
    }

    #[test]
    fn floor_does_not_override_higher_running_value() {
        let next = next_number(Some(5000), 1);
        assert_eq!(DispatchNumber::from_value(next).to_string(), "0005001");
    }

    #[test]
    fn raised_floor_takes_precedence() {
        let next = next_number(Some(10), 100);
        assert_eq!(DispatchNumber::from_value(next).to_string(), "0000100");
    }

    #[test]
    fn width_grows_past_seven_digits() {
        // An override to 9999999 followed by a create: the next number is
        // based on the newest row, and padding is skipped, not truncated.
        let next = next_number(Some(9_999_999), 1);
        assert_eq!(next, 10_000_000);
        assert_eq!(DispatchNumber::from_value(next).to_string(), "10000000");
    }

    #[test]
    fn strict_parse_accepts_padded_digits() {
        assert_eq!(DispatchNumber::parse("0005000").unwrap().value(), 5000);
        assert_eq!(DispatchNumber::parse(" 42 ").unwrap().value(), 42);
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        assert!(DispatchNumber::parse("").is_err());
        assert!(DispatchNumber::parse("A-123").is_err());
        assert!(DispatchNumber::parse("12x").is_err());
    }

    #[test]
    fn lenient_reading_takes_leading_digits() {
        assert_eq!(numeric_value("0005000"), 5000);
        assert_eq!(numeric_value("12x"), 12);
        assert_eq!(numeric_value("A-123"), 0);
        assert_eq!(numeric_value(""), 0);
    }

    #[test]
    fn display_round_trips() {
        let n = DispatchNumber::from_value(42);
        assert_eq!(numeric_value(&n.to_string()), 42);
    }

    proptest! {
        /// The issued number is always strictly greater than the last issued
        /// one and never below the floor.
        #[test]
        fn next_is_monotonic_and_floor_respecting(
            last in proptest::option::of(0_u64..1_000_000_000),
            floor in 1_u64..1_000_000_000,
        ) {
            let next = next_number(last, floor);
            prop_assert!(next >= floor);
            if let Some(last) = last {
                prop_assert!(next > last);
            }
        }

        /// Formatting never loses the numeric value.
        #[test]
        fn format_preserves_value(value in 0_u64..u64::MAX / 2) {
            let display = DispatchNumber::from_value(value).to_string();
            prop_assert!(display.len() >= DISPLAY_WIDTH);
            prop_assert_eq!(numeric_value(&display), value);
        }
    }
}
