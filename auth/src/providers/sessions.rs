//! Session store trait.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_core::types::UserId;

/// A stored session. Only the token digest is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// SHA-256 digest of the bearer token, base64-encoded.
    pub token_hash: String,
    /// Owning user.
    pub user_id: UserId,
    /// When the session was issued.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// Session storage.
///
/// Keys are token digests; the store never sees a raw token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    async fn insert(&self, session: SessionRecord) -> Result<()>;

    /// Look up a session by token digest. Expiry is the caller's check so
    /// that "expired" and "missing" can be reported differently.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    async fn lookup(&self, token_hash: &str) -> Result<Option<SessionRecord>>;

    /// Remove a session (logout).
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure; removing an absent session is
    /// not an error.
    async fn revoke(&self, token_hash: &str) -> Result<()>;

    /// Drop all sessions that expired before `now`. Returns how many rows
    /// went away.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
