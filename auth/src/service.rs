//! The authenticator: login, session validation, logout.

use crate::error::{AuthError, Result};
use crate::providers::{SessionRecord, SessionStore, UserStore};
use crate::token::{generate_token, hash_token};
use crate::user::{burn_verification, verify_password, User};
use chrono::Duration;
use despacho_core::environment::Clock;
use std::sync::Arc;

/// Successful login: the raw token (shown exactly once) plus the user.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The bearer token to hand to the client.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// A validated session, as handed to request handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The authenticated user.
    pub user: User,
    /// Digest of the presenting token, for logout.
    pub token_hash: String,
}

impl AuthenticatedUser {
    /// Require the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InsufficientPermissions`] for non-admins.
    pub fn require_admin(&self) -> Result<()> {
        if self.user.role.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions { required: "admin" })
        }
    }
}

/// Login and session validation over pluggable stores.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl Authenticator {
    /// Create an authenticator.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            clock,
            session_ttl,
        }
    }

    /// Verify credentials and issue a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for a wrong username *or*
    /// password (deliberately indistinguishable), and storage errors
    /// otherwise.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let Some(record) = self.users.by_username(username.trim()).await? else {
            // Unknown username: burn an equivalent bcrypt verification so
            // the response time does not reveal which usernames exist.
            burn_verification(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        let now = self.clock.now();
        self.sessions
            .insert(SessionRecord {
                token_hash: hash_token(&token),
                user_id: record.user.id,
                created_at: now,
                expires_at: now + self.session_ttl,
            })
            .await?;

        tracing::info!(user = %record.user.username, "session issued");

        Ok(LoginOutcome {
            token,
            user: record.user,
        })
    }

    /// Validate a bearer token and resolve the current user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] for unknown/revoked tokens or when
    ///   the owning user no longer exists
    /// - [`AuthError::SessionExpired`] past the TTL (the session is revoked
    ///   as a side effect)
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let token_hash = hash_token(token);
        let Some(session) = self.sessions.lookup(&token_hash).await? else {
            return Err(AuthError::SessionNotFound);
        };

        if session.expires_at < self.clock.now() {
            self.sessions.revoke(&token_hash).await?;
            return Err(AuthError::SessionExpired);
        }

        let Some(user) = self.users.by_id(session.user_id).await? else {
            // The account was deleted while the session was live.
            self.sessions.revoke(&token_hash).await?;
            return Err(AuthError::SessionNotFound);
        };

        Ok(AuthenticatedUser { user, token_hash })
    }

    /// Revoke the session behind a bearer token.
    ///
    /// # Errors
    ///
    /// Returns storage errors; revoking an unknown token succeeds silently.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.revoke(&hash_token(token)).await
    }

    /// Drop expired sessions. Intended for a periodic sweep.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn purge_expired(&self) -> Result<u64> {
        self.sessions.purge_expired(self.clock.now()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::mocks::{MemorySessionStore, MemoryUserStore};
    use crate::user::NewUser;
    use chrono::{DateTime, Utc};
    use despacho_core::types::Role;

    #[derive(Clone)]
    struct TestClock(std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>);

    impl TestClock {
        fn at(rfc3339: &str) -> Self {
            Self(std::sync::Arc::new(std::sync::Mutex::new(
                DateTime::parse_from_rfc3339(rfc3339)
                    .expect("valid timestamp")
                    .with_timezone(&Utc),
            )))
        }

        fn advance(&self, by: Duration) {
            let mut guard = self.0.lock().expect("clock lock");
            *guard += by;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock lock")
        }
    }

    async fn authenticator(clock: TestClock) -> Authenticator {
        let users = Arc::new(MemoryUserStore::new());
        users
            .create(NewUser::create("admin", "admin123", Role::Admin).expect("valid user"))
            .await
            .expect("seed admin");
        Authenticator::new(
            users,
            Arc::new(MemorySessionStore::new()),
            Arc::new(clock),
            Duration::days(7),
        )
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let auth = authenticator(TestClock::at("2025-01-01T12:00:00Z")).await;
        let login = auth.login("admin", "admin123").await.expect("login works");
        let current = auth
            .authenticate(&login.token)
            .await
            .expect("session is valid");
        assert_eq!(current.user.username, "admin");
        assert!(current.require_admin().is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let auth = authenticator(TestClock::at("2025-01-01T12:00:00Z")).await;
        let wrong_pw = auth.login("admin", "nope123").await;
        let unknown = auth.login("ghost", "nope123").await;
        assert_eq!(wrong_pw.err(), Some(AuthError::InvalidCredentials));
        assert_eq!(unknown.err(), Some(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_revoked() {
        let clock = TestClock::at("2025-01-01T12:00:00Z");
        let auth = authenticator(clock.clone()).await;
        let login = auth.login("admin", "admin123").await.expect("login works");

        clock.advance(Duration::days(8));
        let expired = auth.authenticate(&login.token).await;
        assert_eq!(expired.err(), Some(AuthError::SessionExpired));

        // A second attempt sees the revoked session as missing.
        let gone = auth.authenticate(&login.token).await;
        assert_eq!(gone.err(), Some(AuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn logout_revokes_session() {
        let auth = authenticator(TestClock::at("2025-01-01T12:00:00Z")).await;
        let login = auth.login("admin", "admin123").await.expect("login works");
        auth.logout(&login.token).await.expect("logout works");
        let gone = auth.authenticate(&login.token).await;
        assert_eq!(gone.err(), Some(AuthError::SessionNotFound));
    }
}
