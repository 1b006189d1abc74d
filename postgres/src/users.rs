//! `PostgreSQL` implementations of the auth provider traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_auth::error::{AuthError, Result};
use despacho_auth::providers::{SessionRecord, SessionStore, UserStore};
use despacho_auth::user::{NewUser, User, UserRecord};
use despacho_core::types::{Role, UserId};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// User store backed by the `users` table.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            user: User {
                id: UserId::new(self.id),
                username: self.username,
                role: Role::from_db(&self.role),
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

fn map_user_error(err: sqlx::Error, username: &str) -> AuthError {
    if crate::is_unique_violation(&err) {
        AuthError::DuplicateUsername {
            username: username.to_string(),
        }
    } else {
        AuthError::storage(err)
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::storage)?;
        Ok(row.map(UserRow::into_record))
    }

    async fn by_id(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at
             FROM users WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::storage)?;
        Ok(row.map(|r| r.into_record().user))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AuthError::storage)?;
        Ok(rows.into_iter().map(|r| r.into_record().user).collect())
    }

    async fn create(&self, new: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (username, password_hash, role)
             VALUES ($1, $2, $3)
             RETURNING id, username, password_hash, role, created_at",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_user_error(e, &new.username))?;
        Ok(row.into_record().user)
    }

    async fn update(
        &self,
        id: UserId,
        username: &str,
        role: Role,
        password_hash: Option<&str>,
    ) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users
             SET username = $1,
                 role = $2,
                 password_hash = COALESCE($3, password_hash)
             WHERE id = $4
             RETURNING id, username, password_hash, role, created_at",
        )
        .bind(username)
        .bind(role.as_str())
        .bind(password_hash)
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_user_error(e, username))?;

        row.map(|r| r.into_record().user)
            .ok_or(AuthError::UserNotFound)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

/// Session store backed by the `sessions` table.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRow {
    token_hash: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert(&self, session: SessionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token_hash)
        .bind(session.user_id.value())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(AuthError::storage)?;
        Ok(())
    }

    async fn lookup(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::storage)?;

        Ok(row.map(|r| SessionRecord {
            token_hash: r.token_hash,
            user_id: UserId::new(r.user_id),
            created_at: r.created_at,
            expires_at: r.expires_at,
        }))
    }

    async fn revoke(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(AuthError::storage)?;
        Ok(result.rows_affected())
    }
}
