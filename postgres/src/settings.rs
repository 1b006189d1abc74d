//! Settings store. The numbering floor lives here; its row doubles as the
//! allocation lock (see `dispatches`), so `set` updates but never deletes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::repository::SettingsStore;
use despacho_core::settings::Setting;
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// Settings store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresSettingsStore {
    pool: PgPool,
}

impl PostgresSettingsStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SettingRow {
    id: i64,
    key: String,
    value: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SettingRow {
    fn into_domain(self) -> Setting {
        Setting {
            id: self.id,
            key: self.key,
            value: self.value,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SETTING_COLUMNS: &str = "id, key, value, description, created_at, updated_at";

#[async_trait]
impl SettingsStore for PostgresSettingsStore {
    async fn list(&self) -> StoreResult<Vec<Setting>> {
        let rows: Vec<SettingRow> =
            sqlx::query_as(&format!("SELECT {SETTING_COLUMNS} FROM settings ORDER BY key"))
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(SettingRow::into_domain).collect())
    }

    async fn get(&self, key: &str) -> StoreResult<Setting> {
        let row: Option<SettingRow> =
            sqlx::query_as(&format!("SELECT {SETTING_COLUMNS} FROM settings WHERE key = $1"))
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        row.map(SettingRow::into_domain).ok_or(StoreError::NotFound {
            entity: "setting",
            id: 0,
        })
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<Setting> {
        let row: Option<SettingRow> = sqlx::query_as(&format!(
            "UPDATE settings SET value = $1, updated_at = now()
             WHERE key = $2
             RETURNING {SETTING_COLUMNS}"
        ))
        .bind(value)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(SettingRow::into_domain).ok_or(StoreError::NotFound {
            entity: "setting",
            id: 0,
        })
    }
}
