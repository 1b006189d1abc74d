//! In-memory session store.

use crate::error::{AuthError, Result};
use crate::providers::{SessionRecord, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory session store keyed by token digest.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions (for assertions).
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::Storage("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: SessionRecord) -> Result<()> {
        self.lock()?.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn lookup(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        Ok(self.lock()?.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str) -> Result<()> {
        self.lock()?.remove(token_hash);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use despacho_core::types::UserId;

    fn record(hash: &str, expires_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            token_hash: hash.to_string(),
            user_id: UserId::new(1),
            created_at: expires_at - chrono::Duration::days(7),
            expires_at,
        }
    }

    #[tokio::test]
    async fn insert_lookup_revoke() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + chrono::Duration::days(1);
        store
            .insert(record("abc", expires))
            .await
            .expect("insert works");
        assert!(store.lookup("abc").await.expect("lookup works").is_some());
        store.revoke("abc").await.expect("revoke works");
        assert!(store.lookup("abc").await.expect("lookup works").is_none());
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store
            .insert(record("old", now - chrono::Duration::hours(1)))
            .await
            .expect("insert works");
        store
            .insert(record("live", now + chrono::Duration::hours(1)))
            .await
            .expect("insert works");

        let dropped = store.purge_expired(now).await.expect("purge works");
        assert_eq!(dropped, 1);
        assert_eq!(store.session_count().expect("count works"), 1);
    }
}
