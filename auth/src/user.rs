//! User accounts and password handling.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use despacho_core::types::{Role, UserId};
use serde::{Deserialize, Serialize};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A user account as exposed to the API (no secrets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage id.
    pub id: UserId,
    /// Login name (unique).
    pub username: String,
    /// Access role.
    pub role: Role,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A user account as read by the auth layer, including the password hash.
///
/// Never serialized; the hash stays inside this crate and the storage layer.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// The public part.
    pub user: User,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

/// A validated request to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name, trimmed.
    pub username: String,
    /// bcrypt hash of the chosen password.
    pub password_hash: String,
    /// Access role.
    pub role: Role,
}

impl NewUser {
    /// Validate a username/password pair and hash the password.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UsernameRequired`] when the username is blank
    /// - [`AuthError::PasswordTooShort`] below [`MIN_PASSWORD_LEN`]
    /// - [`AuthError::Hashing`] when bcrypt fails
    pub fn create(username: &str, password: &str, role: Role) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role,
        })
    }
}

/// Hash a password with bcrypt at the default cost.
///
/// # Errors
///
/// Returns [`AuthError::Hashing`] when bcrypt fails.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored bcrypt hash.
///
/// A malformed stored hash verifies as `false` rather than erroring: a
/// corrupt row must not become a login bypass or a 500.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

/// Burn one bcrypt verification against a fixed hash.
///
/// Called when the username does not exist, so the login path takes the same
/// time either way and does not leak which usernames are registered.
pub fn burn_verification(password: &str) {
    // Any well-formed bcrypt hash works here; the result is discarded.
    const DUMMY_HASH: &str = "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";
    let _ = bcrypt::verify(password, DUMMY_HASH);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("admin123").expect("hashing should work");
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("whatever", "not-a-bcrypt-hash"));
    }

    #[test]
    fn new_user_rejects_blank_username() {
        let err = NewUser::create("   ", "secret1", Role::Employee);
        assert_eq!(err.err(), Some(AuthError::UsernameRequired));
    }

    #[test]
    fn new_user_rejects_short_password() {
        let err = NewUser::create("maria", "abc", Role::Employee);
        assert_eq!(err.err(), Some(AuthError::PasswordTooShort { min: 6 }));
    }

    #[test]
    fn new_user_trims_username() {
        let new = NewUser::create("  maria ", "secret1", Role::Admin).expect("valid user");
        assert_eq!(new.username, "maria");
        assert_eq!(new.role, Role::Admin);
        assert!(verify_password("secret1", &new.password_hash));
    }
}
