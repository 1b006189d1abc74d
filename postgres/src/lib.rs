//! `PostgreSQL` storage for the dispatch backend.
//!
//! Implements the repository traits from `despacho-core` and the auth
//! provider traits from `despacho-auth` on top of sqlx connection pools,
//! with embedded migrations.
//!
//! The one piece with real coordination requirements lives in
//! [`dispatches::PostgresDispatchStore::create`]: number allocation runs
//! inside a transaction serialized by a row lock on the numbering-floor
//! setting, so two concurrent creates can never observe the same ledger
//! tail. Everything else is parameterized CRUD.
//!
//! # Example
//!
//! ```ignore
//! use despacho_postgres::{connect, migrate, PoolSettings};
//!
//! let pool = connect("postgres://localhost/despacho", &PoolSettings::default()).await?;
//! migrate(&pool).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod catalog;
pub mod dispatches;
pub mod fleet;
pub mod settings;
pub mod users;

use despacho_core::error::StoreError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub use audit::PostgresAuditStore;
pub use catalog::{PostgresClientStore, PostgresCompanyStore, PostgresProductStore};
pub use dispatches::PostgresDispatchStore;
pub use fleet::{PostgresNamedEntityStore, PostgresTruckStore};
pub use settings::PostgresSettingsStore;
pub use users::{PostgresSessionStore, PostgresUserStore};

/// Connection pool tuning, loaded from server configuration.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool.
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    pub connect_timeout: u64,
    /// Idle timeout in seconds.
    pub idle_timeout: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: 30,
            idle_timeout: 600,
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the database is unreachable.
pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout))
        .idle_timeout(Duration::from_secs(settings.idle_timeout))
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect: {e}")))
}

/// Run embedded migrations.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
}

/// Check connectivity with a trivial round trip (readiness probe).
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the round trip fails.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(StoreError::backend)
}

/// True when the error is a `PostgreSQL` unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_settings_are_sane() {
        let settings = PoolSettings::default();
        assert!(settings.max_connections >= settings.min_connections);
        assert!(settings.connect_timeout > 0);
    }
}
