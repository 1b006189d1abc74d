//! The ticket ledger and its allocation boundary.
//!
//! Dispatch creation is the only write in the system with coordination
//! requirements: "read floor → read tail → compute next number → insert"
//! must behave as a single serialized unit. This implementation:
//!
//! 1. opens a transaction,
//! 2. upserts the truck record carried on the ticket,
//! 3. locks the `dispatch_start_number` settings row (`FOR UPDATE`);
//!    concurrent creates queue here, so each sees the committed tail of the
//!    previous one,
//! 4. reads the most recently *inserted* ticket's display number (insertion
//!    order, not numeric maximum: administrative renumbering of older rows
//!    does not feed the sequence),
//! 5. computes `max(last + 1, floor)` and inserts.
//!
//! The UNIQUE constraint on `dispatch_no` backstops the lock; if it ever
//! fires (the settings row was deleted mid-flight), the whole cycle is
//! retried once under a fresh snapshot.

use crate::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use despacho_core::dispatch::{CreatedDispatch, Dispatch, MaterialLine, NewDispatch};
use despacho_core::error::{StoreError, StoreResult};
use despacho_core::numbering::{next_number, numeric_value, DispatchNumber};
use despacho_core::repository::{DispatchStore, DispatchUpdate};
use despacho_core::settings::{start_number_or_default, DISPATCH_START_NUMBER};
use despacho_core::types::{DispatchId, EquipmentId, OperatorId, UserId};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;

/// Ledger store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresDispatchStore {
    pool: PgPool,
}

impl PostgresDispatchStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_create(&self, new: &NewDispatch) -> StoreResult<CreatedDispatch> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        upsert_truck(&mut tx, new).await?;

        // Serialization point: every allocation takes this row lock.
        let floor_row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = $1 FOR UPDATE")
                .bind(DISPATCH_START_NUMBER)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        let floor = start_number_or_default(floor_row.as_ref().map(|(v,)| v.as_str()));

        let tail: Option<(String,)> =
            sqlx::query_as("SELECT dispatch_no FROM dispatches ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        let last_issued = tail.map(|(no,)| numeric_value(&no));

        let number = DispatchNumber::from_value(next_number(last_issued, floor));
        let dispatch_no = number.to_string();

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO dispatches
               (dispatch_no, date, time, truck_name, plate, color, fleet_card,
                order_no, order_ticket, driver, volume_m3, materials,
                client_name, phone, total, user_id, equipment_id, operator_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     $14, $15, $16, $17, $18)
             RETURNING id",
        )
        .bind(&dispatch_no)
        .bind(new.date)
        .bind(new.time)
        .bind(&new.truck_name)
        .bind(&new.plate)
        .bind(&new.color)
        .bind(&new.fleet_card)
        .bind(&new.order_no)
        .bind(&new.order_ticket)
        .bind(&new.driver)
        .bind(new.volume_m3)
        .bind(Json(&new.materials))
        .bind(&new.client_name)
        .bind(new.phone.as_deref())
        .bind(new.total)
        .bind(new.user_id.value())
        .bind(new.equipment_id.map(EquipmentId::value))
        .bind(new.operator_id.map(OperatorId::value))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_dispatch_error(e, &dispatch_no))?;

        tx.commit().await.map_err(StoreError::backend)?;

        tracing::info!(dispatch_no = %dispatch_no, floor, last = ?last_issued, "dispatch number assigned");

        Ok(CreatedDispatch {
            id: DispatchId::new(id),
            dispatch_no,
        })
    }
}

#[async_trait]
impl DispatchStore for PostgresDispatchStore {
    async fn create(&self, new: NewDispatch) -> StoreResult<CreatedDispatch> {
        match self.try_create(&new).await {
            Err(StoreError::Duplicate { .. }) => {
                // Only reachable if the floor row was missing and two creates
                // raced to the same number; a second pass sees the fresh tail.
                tracing::warn!("dispatch number conflict, retrying allocation once");
                self.try_create(&new).await
            }
            other => other,
        }
    }

    async fn list(&self, plate: Option<&str>) -> StoreResult<Vec<Dispatch>> {
        let base = "SELECT d.id, d.dispatch_no, d.date, d.time, d.truck_name, d.plate,
                           d.color, d.fleet_card, d.order_no, d.order_ticket, d.driver,
                           d.volume_m3, d.materials, d.client_name, d.phone, d.total,
                           d.user_id, d.equipment_id, d.operator_id, d.created_at,
                           u.username AS user_name,
                           e.name AS equipment_name,
                           o.name AS operator_name
                    FROM dispatches d
                    LEFT JOIN users u ON u.id = d.user_id
                    LEFT JOIN equipment e ON e.id = d.equipment_id
                    LEFT JOIN operators o ON o.id = d.operator_id";

        let rows: Vec<DispatchRow> = if let Some(plate) = plate {
            sqlx::query_as(&format!(
                "{base} WHERE d.plate ILIKE $1 ORDER BY d.date DESC, d.time DESC"
            ))
            .bind(format!("%{plate}%"))
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as(&format!("{base} ORDER BY d.date DESC, d.time DESC"))
                .fetch_all(&self.pool)
                .await
        }
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(DispatchRow::into_domain).collect())
    }

    async fn get(&self, id: DispatchId) -> StoreResult<Dispatch> {
        let row: Option<DispatchRow> = sqlx::query_as(
            "SELECT d.id, d.dispatch_no, d.date, d.time, d.truck_name, d.plate,
                    d.color, d.fleet_card, d.order_no, d.order_ticket, d.driver,
                    d.volume_m3, d.materials, d.client_name, d.phone, d.total,
                    d.user_id, d.equipment_id, d.operator_id, d.created_at,
                    u.username AS user_name,
                    e.name AS equipment_name,
                    o.name AS operator_name
             FROM dispatches d
             LEFT JOIN users u ON u.id = d.user_id
             LEFT JOIN equipment e ON e.id = d.equipment_id
             LEFT JOIN operators o ON o.id = d.operator_id
             WHERE d.id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(DispatchRow::into_domain).ok_or(StoreError::NotFound {
            entity: "dispatch",
            id: id.value(),
        })
    }

    async fn update(&self, id: DispatchId, update: DispatchUpdate) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        upsert_truck(&mut tx, &update.body).await?;

        let result = sqlx::query(
            "UPDATE dispatches
             SET dispatch_no = $1, date = $2, time = $3, truck_name = $4,
                 plate = $5, color = $6, fleet_card = $7, order_no = $8,
                 order_ticket = $9, driver = $10, volume_m3 = $11,
                 materials = $12, client_name = $13, phone = $14, total = $15,
                 user_id = $16, equipment_id = $17, operator_id = $18
             WHERE id = $19",
        )
        .bind(&update.dispatch_no)
        .bind(update.body.date)
        .bind(update.body.time)
        .bind(&update.body.truck_name)
        .bind(&update.body.plate)
        .bind(&update.body.color)
        .bind(&update.body.fleet_card)
        .bind(&update.body.order_no)
        .bind(&update.body.order_ticket)
        .bind(&update.body.driver)
        .bind(update.body.volume_m3)
        .bind(Json(&update.body.materials))
        .bind(&update.body.client_name)
        .bind(update.body.phone.as_deref())
        .bind(update.body.total)
        .bind(update.body.user_id.value())
        .bind(update.body.equipment_id.map(EquipmentId::value))
        .bind(update.body.operator_id.map(OperatorId::value))
        .bind(id.value())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_dispatch_error(e, &update.dispatch_no))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            });
        }

        tx.commit().await.map_err(StoreError::backend)
    }

    async fn override_number(&self, id: DispatchId, dispatch_no: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE dispatches SET dispatch_no = $1 WHERE id = $2")
            .bind(dispatch_no)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_dispatch_error(e, dispatch_no))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: DispatchId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM dispatches WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "dispatch",
                id: id.value(),
            });
        }
        Ok(())
    }
}

/// Upsert the truck carried on a ticket. Blank incoming fields never clobber
/// stored values (COALESCE on conflict).
async fn upsert_truck(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewDispatch,
) -> StoreResult<()> {
    let make = if new.truck_name.is_empty() {
        "SIN ESPECIFICAR"
    } else {
        new.truck_name.as_str()
    };
    sqlx::query(
        "INSERT INTO trucks (plate, make, color, fleet_card, volume_m3, status)
         VALUES ($1, $2, NULLIF($3, ''), NULLIF($4, ''), $5, 'activo')
         ON CONFLICT (plate) DO UPDATE SET
             make       = COALESCE(NULLIF(EXCLUDED.make, ''), trucks.make),
             color      = COALESCE(EXCLUDED.color, trucks.color),
             fleet_card = COALESCE(EXCLUDED.fleet_card, trucks.fleet_card),
             volume_m3  = COALESCE(EXCLUDED.volume_m3, trucks.volume_m3),
             updated_at = now()",
    )
    .bind(&new.plate)
    .bind(make)
    .bind(&new.color)
    .bind(&new.fleet_card)
    .bind(new.volume_m3)
    .execute(&mut **tx)
    .await
    .map_err(StoreError::backend)?;
    Ok(())
}

fn map_dispatch_error(err: sqlx::Error, dispatch_no: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate {
            entity: "dispatch",
            detail: format!("dispatch_no {dispatch_no}"),
        }
    } else {
        StoreError::backend(err)
    }
}

#[derive(FromRow)]
struct DispatchRow {
    id: i64,
    dispatch_no: String,
    date: NaiveDate,
    time: NaiveTime,
    truck_name: String,
    plate: String,
    color: String,
    fleet_card: String,
    order_no: String,
    order_ticket: String,
    driver: String,
    volume_m3: Option<f64>,
    materials: Json<Vec<MaterialLine>>,
    client_name: String,
    phone: Option<String>,
    total: f64,
    user_id: i64,
    equipment_id: Option<i64>,
    operator_id: Option<i64>,
    created_at: DateTime<Utc>,
    user_name: Option<String>,
    equipment_name: Option<String>,
    operator_name: Option<String>,
}

impl DispatchRow {
    fn into_domain(self) -> Dispatch {
        Dispatch {
            id: DispatchId::new(self.id),
            dispatch_no: self.dispatch_no,
            date: self.date,
            time: self.time,
            truck_name: self.truck_name,
            plate: self.plate,
            color: self.color,
            fleet_card: self.fleet_card,
            order_no: self.order_no,
            order_ticket: self.order_ticket,
            driver: self.driver,
            volume_m3: self.volume_m3,
            materials: self.materials.0,
            client_name: self.client_name,
            phone: self.phone,
            total: self.total,
            user_id: UserId::new(self.user_id),
            equipment_id: self.equipment_id.map(EquipmentId::new),
            operator_id: self.operator_id.map(OperatorId::new),
            user_name: self.user_name,
            equipment_name: self.equipment_name,
            operator_name: self.operator_name,
            created_at: self.created_at,
        }
    }
}
