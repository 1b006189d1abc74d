//! Error types for domain validation and storage operations.

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Validation failures raised by the functional core.
///
/// These are raised *before* any storage side effect runs: a draft that does
/// not validate never reaches the allocator and never consumes a number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A numeric field failed to parse or was out of range.
    #[error("invalid {field}: {reason}")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("invalid value for setting {key}: {reason}")]
    InvalidSetting {
        /// Setting key.
        key: String,
        /// What went wrong.
        reason: String,
    },

    /// A caller-supplied display number was rejected.
    #[error("invalid dispatch number {value:?}")]
    InvalidDispatchNumber {
        /// The rejected value.
        value: String,
    },
}

/// Result type alias for repository operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures raised by the storage layer.
///
/// Backend details are carried as strings so the core stays free of any
/// driver dependency; the web layer maps these onto HTTP statuses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity kind, e.g. "dispatch".
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// A uniqueness constraint was violated.
    #[error("duplicate {entity}: {detail}")]
    Duplicate {
        /// Entity kind.
        entity: &'static str,
        /// Which value collided.
        detail: String,
    },

    /// The draft failed validation inside the storage boundary.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend failed.
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a backend failure with a formatted message.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = DomainError::MissingField { field: "plate" };
        assert_eq!(err.to_string(), "plate is required");
    }

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound {
            entity: "dispatch",
            id: 42,
        };
        assert_eq!(err.to_string(), "dispatch with id 42 not found");
    }

    #[test]
    fn domain_error_converts() {
        let err: StoreError = DomainError::MissingField { field: "client" }.into();
        assert_eq!(err.to_string(), "client is required");
    }
}
