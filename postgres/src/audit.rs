//! Audit trail store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_core::audit::{AuditEvent, AuditRecord};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::repository::AuditStore;
use despacho_core::types::UserId;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;

/// Audit store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: i64,
    user_id: i64,
    username: String,
    action: String,
    entity_type: String,
    entity_id: Option<i64>,
    changes: Option<Json<serde_json::Value>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_domain(self) -> AuditRecord {
        AuditRecord {
            id: self.id,
            user_id: UserId::new(self.user_id),
            username: self.username,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            changes: self.changes.map_or(serde_json::Value::Null, |j| j.0),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        }
    }
}

const AUDIT_COLUMNS: &str = "id, user_id, username, action, entity_type, entity_id, \
                             changes, ip_address, user_agent, created_at";

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn record(&self, event: AuditEvent) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs
               (user_id, username, action, entity_type, entity_id, changes,
                ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.user_id.value())
        .bind(&event.username)
        .bind(event.action.as_str())
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(Json(&event.changes))
        .bind(event.origin.ip_address.as_deref())
        .bind(event.origin.user_agent.as_deref())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(AuditRow::into_domain).collect())
    }

    async fn by_user(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id.value())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(AuditRow::into_domain).collect())
    }

    async fn by_entity(&self, entity_type: &str, entity_id: i64) -> StoreResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs
             WHERE entity_type = $1 AND entity_id = $2 ORDER BY created_at DESC"
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(AuditRow::into_domain).collect())
    }
}
