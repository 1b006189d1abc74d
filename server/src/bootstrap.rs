//! Production wiring: pool, migrations, stores, bootstrap admin.

use crate::config::Config;
use crate::state::{AppState, ReadinessProbe};
use async_trait::async_trait;
use despacho_auth::providers::UserStore;
use despacho_auth::user::NewUser;
use despacho_auth::Authenticator;
use despacho_core::environment::SystemClock;
use despacho_core::error::StoreError;
use despacho_core::types::Role;
use despacho_postgres::{
    connect, migrate, ping, PoolSettings, PostgresAuditStore, PostgresClientStore,
    PostgresCompanyStore, PostgresDispatchStore, PostgresNamedEntityStore, PostgresProductStore,
    PostgresSessionStore, PostgresSettingsStore, PostgresTruckStore, PostgresUserStore,
};
use sqlx::postgres::PgPool;
use std::sync::Arc;

/// Database-backed readiness probe.
pub struct PgReadiness {
    pool: PgPool,
}

#[async_trait]
impl ReadinessProbe for PgReadiness {
    async fn ready(&self) -> Result<(), String> {
        ping(&self.pool).await.map_err(|e| e.to_string())
    }
}

/// Connect, migrate, seed the bootstrap admin, and assemble [`AppState`].
///
/// # Errors
///
/// Fails when the database is unreachable, a migration fails, or the
/// bootstrap admin cannot be created.
pub async fn build_state(config: &Config) -> Result<AppState, StoreError> {
    let pool = connect(
        &config.database.url,
        &PoolSettings {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            connect_timeout: config.database.connect_timeout,
            idle_timeout: config.database.idle_timeout,
        },
    )
    .await?;

    migrate(&pool).await?;

    let users = Arc::new(PostgresUserStore::new(pool.clone()));
    ensure_bootstrap_admin(
        users.as_ref(),
        &config.auth.admin_username,
        &config.auth.admin_password,
    )
    .await?;

    let sessions = Arc::new(PostgresSessionStore::new(pool.clone()));
    let clock = Arc::new(SystemClock);
    let session_ttl = chrono::Duration::seconds(
        i64::try_from(config.auth.session_ttl).unwrap_or(604_800),
    );
    let auth = Authenticator::new(users.clone(), sessions, clock.clone(), session_ttl);

    Ok(AppState {
        dispatches: Arc::new(PostgresDispatchStore::new(pool.clone())),
        settings: Arc::new(PostgresSettingsStore::new(pool.clone())),
        clients: Arc::new(PostgresClientStore::new(pool.clone())),
        companies: Arc::new(PostgresCompanyStore::new(pool.clone())),
        products: Arc::new(PostgresProductStore::new(pool.clone())),
        equipment: Arc::new(PostgresNamedEntityStore::equipment(pool.clone())),
        operators: Arc::new(PostgresNamedEntityStore::operators(pool.clone())),
        trucks: Arc::new(PostgresTruckStore::new(pool.clone())),
        audit: Arc::new(PostgresAuditStore::new(pool.clone())),
        users,
        auth,
        clock,
        readiness: Arc::new(PgReadiness { pool }),
    })
}

/// Create the bootstrap admin account when it does not exist yet.
///
/// The password is hashed at startup rather than shipped in a migration, so
/// the hash in the database is always real. A reused default password is
/// caught by config validation before this runs.
async fn ensure_bootstrap_admin(
    users: &PostgresUserStore,
    username: &str,
    password: &str,
) -> Result<(), StoreError> {
    let existing = users
        .by_username(username)
        .await
        .map_err(StoreError::backend)?;
    if existing.is_some() {
        tracing::debug!(username, "bootstrap admin already exists");
        return Ok(());
    }

    let new = NewUser::create(username, password, Role::Admin).map_err(StoreError::backend)?;
    users.create(new).await.map_err(StoreError::backend)?;
    tracing::warn!(
        username,
        "bootstrap admin created; change the password after first login"
    );
    Ok(())
}
