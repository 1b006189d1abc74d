//! User repository trait.

use crate::error::Result;
use crate::user::{NewUser, User, UserRecord};
use async_trait::async_trait;
use despacho_core::types::{Role, UserId};

/// User repository.
///
/// Abstracts over user account storage (PostgreSQL in production).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user, including the password hash, by login name.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; an unknown username is
    /// `Ok(None)` so the login path controls its own timing.
    async fn by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    async fn by_id(&self, id: UserId) -> Result<Option<User>>;

    /// List all users (without hashes).
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    async fn list(&self) -> Result<Vec<User>>;

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::DuplicateUsername`] on collision.
    async fn create(&self, new: NewUser) -> Result<User>;

    /// Update username/role, and the password when a new hash is given.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when the id does not exist.
    async fn update(
        &self,
        id: UserId,
        username: &str,
        role: Role,
        password_hash: Option<&str>,
    ) -> Result<User>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when the id does not exist.
    async fn delete(&self, id: UserId) -> Result<()>;
}
