//! System settings: a small key/value table of admin-tunable parameters.
//!
//! The only setting the core cares about is the dispatch numbering floor,
//! but the surface is generic so new keys don't need schema changes.

use crate::error::DomainError;
use crate::numbering::DEFAULT_START_NUMBER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the numbering floor setting.
pub const DISPATCH_START_NUMBER: &str = "dispatch_start_number";

/// A persisted setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    /// Storage id.
    pub id: i64,
    /// Setting key.
    pub key: String,
    /// Raw value (stored as text).
    pub value: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Parse a stored floor value. Invariant: the floor is an integer ≥ 1.
///
/// # Errors
///
/// Returns [`DomainError::InvalidSetting`] when the value does not parse or
/// is below 1. Callers on the *read* path typically fall back to
/// [`DEFAULT_START_NUMBER`] instead of propagating; the *write* path must
/// reject the value.
pub fn parse_start_number(value: &str) -> Result<u64, DomainError> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|_| DomainError::InvalidSetting {
            key: DISPATCH_START_NUMBER.to_string(),
            reason: format!("{value:?} is not an integer"),
        })?;
    if parsed < DEFAULT_START_NUMBER {
        return Err(DomainError::InvalidSetting {
            key: DISPATCH_START_NUMBER.to_string(),
            reason: format!("must be at least 1, got {parsed}"),
        });
    }
    Ok(parsed)
}

/// Read a floor value leniently: unreadable or missing values fall back to
/// the default of 1, per the allocator's failure semantics.
#[must_use]
pub fn start_number_or_default(value: Option<&str>) -> u64 {
    value
        .and_then(|v| parse_start_number(v).ok())
        .unwrap_or(DEFAULT_START_NUMBER)
}

/// Validate a caller-supplied value for a given key before it is written.
///
/// Only the numbering floor has structure today; other keys accept any
/// non-empty text.
///
/// # Errors
///
/// Returns [`DomainError::InvalidSetting`] when the value is empty or, for
/// the floor key, fails [`parse_start_number`].
pub fn validate_setting(key: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidSetting {
            key: key.to_string(),
            reason: "value must not be empty".to_string(),
        });
    }
    if key == DISPATCH_START_NUMBER {
        parse_start_number(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_floor() {
        assert_eq!(parse_start_number("5000"), Ok(5000));
        assert_eq!(parse_start_number(" 1 "), Ok(1));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(parse_start_number("0").is_err());
        assert!(parse_start_number("-3").is_err());
        assert!(parse_start_number("abc").is_err());
    }

    #[test]
    fn lenient_read_falls_back_to_one() {
        assert_eq!(start_number_or_default(None), 1);
        assert_eq!(start_number_or_default(Some("not-a-number")), 1);
        assert_eq!(start_number_or_default(Some("0")), 1);
        assert_eq!(start_number_or_default(Some("250")), 250);
    }

    #[test]
    fn write_path_validates_floor_key() {
        assert!(validate_setting(DISPATCH_START_NUMBER, "100").is_ok());
        assert!(validate_setting(DISPATCH_START_NUMBER, "0").is_err());
        assert!(validate_setting("invoice_footer", "Gracias por su compra").is_ok());
        assert!(validate_setting("invoice_footer", "  ").is_err());
    }
}
