//! Client endpoints.
//!
//! Reads and creation are public: ticket entry self-registers clients by
//! name, and an existing name (any casing) is returned rather than
//! duplicated. Mutations of existing rows are admin-gated.

use crate::api::DataResponse;
use crate::auth::RequireAdmin;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::catalog::{Client, ClientDraft};
use despacho_core::types::ClientId;
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde_json::json;

/// List all clients.
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Client>>>, AppError> {
    Ok(Json(DataResponse::new(state.clients.list().await?)))
}

/// Find-or-create a client by name.
pub async fn create_client(
    State(state): State<AppState>,
    Json(draft): Json<ClientDraft>,
) -> Result<Json<Client>, AppError> {
    let new = draft.validate()?;
    Ok(Json(state.clients.find_or_create(new).await?))
}

/// Update a client (admin only).
pub async fn update_client(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(draft): Json<ClientDraft>,
) -> Result<Json<Client>, AppError> {
    let new = draft.validate()?;
    let client = state.clients.update(ClientId::new(id), new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "client",
                Some(id),
                json!({ "name": client.name }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(client))
}

/// Delete a client (admin only).
pub async fn delete_client(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.clients.delete(ClientId::new(id)).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "client",
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "client deleted" })))
}
