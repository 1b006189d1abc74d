//! Fleet endpoints: trucks, equipment, operators.
//!
//! Trucks are written through dispatch creation (the upsert keeps the most
//! recent non-blank values per plate); the endpoint here is the read side.
//! Equipment and operators are name-only entities sharing one handler set.

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::catalog::{NamedEntity, Truck};
use despacho_core::repository::NamedEntityStore;
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query parameters for the truck listing.
#[derive(Debug, Deserialize)]
pub struct TruckQuery {
    /// Case-insensitive plate substring filter.
    pub plate: Option<String>,
}

/// List the truck fleet.
pub async fn list_trucks(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<TruckQuery>,
) -> Result<Json<DataResponse<Vec<Truck>>>, AppError> {
    let trucks = state.trucks.list(query.plate.as_deref()).await?;
    Ok(Json(DataResponse::new(trucks)))
}

/// Which name-only table a request addresses.
#[derive(Debug, Clone, Copy)]
pub enum NamedKind {
    /// The equipment table.
    Equipment,
    /// The operators table.
    Operators,
}

impl NamedKind {
    const fn entity(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Operators => "operator",
        }
    }

    fn store(self, state: &AppState) -> Arc<dyn NamedEntityStore> {
        match self {
            Self::Equipment => state.equipment.clone(),
            Self::Operators => state.operators.clone(),
        }
    }
}

/// Name payload for create/rename.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    /// The entity name.
    pub name: String,
}

fn require_name(request: &NameRequest) -> Result<&str, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(name)
}

/// List entries of one name-only table.
pub async fn list_named(
    kind: NamedKind,
    state: AppState,
) -> Result<Json<DataResponse<Vec<NamedEntity>>>, AppError> {
    Ok(Json(DataResponse::new(kind.store(&state).list().await?)))
}

/// Create an entry in one name-only table (admin only).
pub async fn create_named(
    kind: NamedKind,
    state: AppState,
    admin: RequireAdmin,
    origin: RequestClient,
    request: NameRequest,
) -> Result<(StatusCode, Json<NamedEntity>), AppError> {
    let name = require_name(&request)?;
    let entity = kind.store(&state).create(name).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Create,
                kind.entity(),
                Some(entity.id),
                json!({ "name": entity.name }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(entity)))
}

/// Rename an entry (admin only).
pub async fn rename_named(
    kind: NamedKind,
    state: AppState,
    admin: RequireAdmin,
    origin: RequestClient,
    id: i64,
    request: NameRequest,
) -> Result<Json<NamedEntity>, AppError> {
    let name = require_name(&request)?;
    let entity = kind.store(&state).rename(id, name).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                kind.entity(),
                Some(id),
                json!({ "name": entity.name }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(entity))
}

/// Delete an entry (admin only).
pub async fn delete_named(
    kind: NamedKind,
    state: AppState,
    admin: RequireAdmin,
    origin: RequestClient,
    id: i64,
) -> Result<Json<serde_json::Value>, AppError> {
    kind.store(&state).delete(id).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                kind.entity(),
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "deleted" })))
}

// Axum route functions: thin wrappers binding the kind.

/// `GET /api/equipment`
pub async fn list_equipment(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<NamedEntity>>>, AppError> {
    list_named(NamedKind::Equipment, state).await
}

/// `POST /api/equipment`
pub async fn create_equipment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Json(request): Json<NameRequest>,
) -> Result<(StatusCode, Json<NamedEntity>), AppError> {
    create_named(NamedKind::Equipment, state, admin, origin, request).await
}

/// `PUT /api/equipment/{id}`
pub async fn rename_equipment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(request): Json<NameRequest>,
) -> Result<Json<NamedEntity>, AppError> {
    rename_named(NamedKind::Equipment, state, admin, origin, id, request).await
}

/// `DELETE /api/equipment/{id}`
pub async fn delete_equipment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_named(NamedKind::Equipment, state, admin, origin, id).await
}

/// `GET /api/operators`
pub async fn list_operators(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<NamedEntity>>>, AppError> {
    list_named(NamedKind::Operators, state).await
}

/// `POST /api/operators`
pub async fn create_operator(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Json(request): Json<NameRequest>,
) -> Result<(StatusCode, Json<NamedEntity>), AppError> {
    create_named(NamedKind::Operators, state, admin, origin, request).await
}

/// `PUT /api/operators/{id}`
pub async fn rename_operator(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(request): Json<NameRequest>,
) -> Result<Json<NamedEntity>, AppError> {
    rename_named(NamedKind::Operators, state, admin, origin, id, request).await
}

/// `DELETE /api/operators/{id}`
pub async fn delete_operator(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_named(NamedKind::Operators, state, admin, origin, id).await
}
