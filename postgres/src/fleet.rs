//! Fleet stores: trucks, equipment, operators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use despacho_core::catalog::{NamedEntity, Truck};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::repository::{NamedEntityStore, TruckStore};
use despacho_core::types::TruckId;
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// Truck store backed by `PostgreSQL`. Rows are written by dispatch creation
/// (see `dispatches`); this store only reads the fleet back.
#[derive(Clone)]
pub struct PostgresTruckStore {
    pool: PgPool,
}

impl PostgresTruckStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TruckRow {
    id: i64,
    plate: String,
    make: Option<String>,
    color: Option<String>,
    fleet_card: Option<String>,
    volume_m3: Option<f64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TruckRow {
    fn into_domain(self) -> Truck {
        Truck {
            id: TruckId::new(self.id),
            plate: self.plate,
            make: self.make,
            color: self.color,
            fleet_card: self.fleet_card,
            volume_m3: self.volume_m3,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl TruckStore for PostgresTruckStore {
    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Truck>> {
        let base = "SELECT id, plate, make, color, fleet_card, volume_m3, status,
                           created_at, updated_at
                    FROM trucks";

        let rows: Vec<TruckRow> = if let Some(plate) = plate {
            sqlx::query_as(&format!("{base} WHERE plate ILIKE $1 ORDER BY plate"))
                .bind(format!("%{plate}%"))
                .fetch_all(&self.pool)
                .await
        } else {
            sqlx::query_as(&format!("{base} ORDER BY plate"))
                .fetch_all(&self.pool)
                .await
        }
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(TruckRow::into_domain).collect())
    }
}

/// Store for the name-only entities. One type serves both tables; the table
/// name is fixed at construction so handlers cannot inject it.
#[derive(Clone)]
pub struct PostgresNamedEntityStore {
    pool: PgPool,
    table: &'static str,
    entity: &'static str,
}

impl PostgresNamedEntityStore {
    /// Store over the `equipment` table.
    #[must_use]
    pub const fn equipment(pool: PgPool) -> Self {
        Self {
            pool,
            table: "equipment",
            entity: "equipment",
        }
    }

    /// Store over the `operators` table.
    #[must_use]
    pub const fn operators(pool: PgPool) -> Self {
        Self {
            pool,
            table: "operators",
            entity: "operator",
        }
    }
}

#[derive(FromRow)]
struct NamedRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl NamedRow {
    fn into_domain(self) -> NamedEntity {
        NamedEntity {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl NamedEntityStore for PostgresNamedEntityStore {
    async fn list(&self) -> StoreResult<Vec<NamedEntity>> {
        let rows: Vec<NamedRow> = sqlx::query_as(&format!(
            "SELECT id, name, created_at FROM {} ORDER BY name",
            self.table
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(NamedRow::into_domain).collect())
    }

    async fn create(&self, name: &str) -> StoreResult<NamedEntity> {
        let row: NamedRow = sqlx::query_as(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name, created_at",
            self.table
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.into_domain())
    }

    async fn rename(&self, id: i64, name: &str) -> StoreResult<NamedEntity> {
        let row: Option<NamedRow> = sqlx::query_as(&format!(
            "UPDATE {} SET name = $1 WHERE id = $2 RETURNING id, name, created_at",
            self.table
        ))
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(NamedRow::into_domain).ok_or(StoreError::NotFound {
            entity: self.entity,
            id,
        })
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: self.entity,
                id,
            });
        }
        Ok(())
    }
}
