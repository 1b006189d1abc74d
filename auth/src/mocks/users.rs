//! In-memory user store.

use crate::error::{AuthError, Result};
use crate::providers::UserStore;
use crate::user::{NewUser, User, UserRecord};
use async_trait::async_trait;
use chrono::Utc;
use despacho_core::types::{Role, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    next_id: i64,
    by_id: HashMap<i64, UserRecord>,
}

/// In-memory user store backed by a mutex-guarded map.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::Storage("user store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .by_id
            .values()
            .find(|r| r.user.username == username)
            .cloned())
    }

    async fn by_id(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.by_id.get(&id.value()).map(|r| r.user.clone()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let inner = self.lock()?;
        let mut users: Vec<User> = inner.by_id.values().map(|r| r.user.clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn create(&self, new: NewUser) -> Result<User> {
        let mut inner = self.lock()?;
        if inner
            .by_id
            .values()
            .any(|r| r.user.username == new.username)
        {
            return Err(AuthError::DuplicateUsername {
                username: new.username,
            });
        }
        inner.next_id += 1;
        let user = User {
            id: UserId::new(inner.next_id),
            username: new.username,
            role: new.role,
            created_at: Utc::now(),
        };
        inner.by_id.insert(
            user.id.value(),
            UserRecord {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn update(
        &self,
        id: UserId,
        username: &str,
        role: Role,
        password_hash: Option<&str>,
    ) -> Result<User> {
        let mut inner = self.lock()?;
        let record = inner
            .by_id
            .get_mut(&id.value())
            .ok_or(AuthError::UserNotFound)?;
        record.user.username = username.to_string();
        record.user.role = role;
        if let Some(hash) = password_hash {
            record.password_hash = hash.to_string();
        }
        Ok(record.user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let mut inner = self.lock()?;
        inner
            .by_id
            .remove(&id.value())
            .map(|_| ())
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_list_delete() {
        let store = MemoryUserStore::new();
        let user = store
            .create(NewUser::create("maria", "secret1", Role::Employee).expect("valid user"))
            .await
            .expect("create works");

        assert_eq!(store.list().await.expect("list works").len(), 1);
        assert!(store
            .by_username("maria")
            .await
            .expect("lookup works")
            .is_some());

        store.delete(user.id).await.expect("delete works");
        assert!(store.list().await.expect("list works").is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryUserStore::new();
        let new = || NewUser::create("maria", "secret1", Role::Employee).expect("valid user");
        store.create(new()).await.expect("first create works");
        let dup = store.create(new()).await;
        assert!(matches!(dup, Err(AuthError::DuplicateUsername { .. })));
    }
}
