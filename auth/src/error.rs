//! Error types for authentication and authorization operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the auth system, organized by category.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication
    // ═══════════════════════════════════════════════════════════
    /// Invalid username or password. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The bearer token is malformed.
    #[error("Invalid session token")]
    TokenInvalid,

    // ═══════════════════════════════════════════════════════════
    // Sessions
    // ═══════════════════════════════════════════════════════════
    /// Session has expired.
    #[error("Session has expired")]
    SessionExpired,

    /// Session not found (revoked, never issued, or the user is gone).
    #[error("Session not found")]
    SessionNotFound,

    // ═══════════════════════════════════════════════════════════
    // Authorization
    // ═══════════════════════════════════════════════════════════
    /// The caller lacks the required role.
    #[error("Insufficient permissions: {required} role required")]
    InsufficientPermissions {
        /// The role that was required.
        required: &'static str,
    },

    // ═══════════════════════════════════════════════════════════
    // User management
    // ═══════════════════════════════════════════════════════════
    /// Username already taken.
    #[error("Username {username:?} already exists")]
    DuplicateUsername {
        /// The colliding username.
        username: String,
    },

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Password fails the minimum-length policy.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },

    /// Username was blank.
    #[error("Username is required")]
    UsernameRequired,

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════
    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The backing store failed.
    #[error("Auth storage failure: {0}")]
    Storage(String),
}

impl AuthError {
    /// Shorthand for a storage failure with a formatted message.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_error_does_not_leak_detail() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn permissions_error_names_required_role() {
        let err = AuthError::InsufficientPermissions { required: "admin" };
        assert_eq!(
            err.to_string(),
            "Insufficient permissions: admin role required"
        );
    }
}
