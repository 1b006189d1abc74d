//! Dispatch ticket endpoints.
//!
//! - `POST /api/dispatches`: create a ticket (any authenticated user).
//!   Validation runs before allocation: a rejected request never consumes a
//!   number. The display number is assigned by the store's serialized
//!   allocation boundary and returned to the caller.
//! - `GET /api/dispatches?plate=`: list, newest first, joined with user,
//!   equipment and operator names.
//! - `PUT /api/dispatches/{id}`: full edit, admin only (the escape hatch
//!   that may rewrite the display number).
//! - `PUT /api/dispatches/{id}/number`: admin override of the display
//!   number alone, bypassing the allocator.
//! - `DELETE /api/dispatches/{id}`: admin only.

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::dispatch::{CreatedDispatch, Dispatch, DispatchDraft};
use despacho_core::environment::business_date_time;
use despacho_core::repository::DispatchUpdate;
use despacho_core::types::DispatchId;
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde::Deserialize;
use serde_json::json;

/// Query parameters for listing dispatches.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive plate substring filter.
    pub plate: Option<String>,
}

/// Create a new dispatch ticket.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3002/api/dispatches \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "truck_name": "mack granite",
///     "plate": "a-123456",
///     "client_name": "constructora del este",
///     "total": 4500,
///     "materials": [
///       { "product": "Arena lavada", "quantity": 6, "unit_price": 750, "amount": 4500 }
///     ]
///   }'
/// ```
pub async fn create_dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    client: RequestClient,
    Json(draft): Json<DispatchDraft>,
) -> Result<(StatusCode, Json<CreatedDispatch>), AppError> {
    // Ticket date/time default to the server clock on the business wall
    // clock, not the caller's.
    let (date, time) = business_date_time(state.clock.now());
    let new = draft.validate(date, time, user.0.user.id)?;

    let client_name = new.client_name.clone();
    let total = new.total;
    let created = state.dispatches.create(new).await?;

    metrics::counter!("despacho_tickets_created_total").increment(1);

    state
        .record_audit(
            AuditEvent::new(
                user.0.user.id,
                user.0.user.username.clone(),
                AuditAction::Create,
                "dispatch",
                Some(created.id.value()),
                json!({
                    "dispatch_no": created.dispatch_no,
                    "client_name": client_name,
                    "total": total,
                }),
            )
            .with_origin(client.into_origin()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List dispatch tickets, newest first.
pub async fn list_dispatches(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<DataResponse<Vec<Dispatch>>>, AppError> {
    let rows = state.dispatches.list(query.plate.as_deref()).await?;
    Ok(Json(DataResponse::new(rows)))
}

/// Full-edit request: the ticket body plus the (possibly rewritten)
/// display number.
#[derive(Debug, Deserialize)]
pub struct UpdateDispatchRequest {
    /// Replacement display number.
    pub dispatch_no: String,
    /// Replacement ticket fields.
    #[serde(flatten)]
    pub draft: DispatchDraft,
}

/// Edit an existing ticket (admin escape hatch).
pub async fn update_dispatch(
    State(state): State<AppState>,
    admin: RequireAdmin,
    client: RequestClient,
    Path(id): Path<i64>,
    Json(request): Json<UpdateDispatchRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.dispatch_no.trim().is_empty() {
        return Err(AppError::validation("dispatch_no is required"));
    }

    let (date, time) = business_date_time(state.clock.now());
    let body = request.draft.validate(date, time, admin.0.user.id)?;
    let client_name = body.client_name.clone();
    let total = body.total;

    state
        .dispatches
        .update(
            DispatchId::new(id),
            DispatchUpdate {
                dispatch_no: request.dispatch_no,
                body,
            },
        )
        .await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "dispatch",
                Some(id),
                json!({ "client_name": client_name, "total": total }),
            )
            .with_origin(client.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "dispatch updated" })))
}

/// Number-override request.
#[derive(Debug, Deserialize)]
pub struct OverrideNumberRequest {
    /// The caller-supplied display number. Arbitrary string; the allocator
    /// is not consulted.
    pub dispatch_no: String,
}

/// Override a ticket's display number (admin only).
///
/// Does not touch the numbering floor; the next allocation is affected only
/// if this ticket is the most recently created row.
pub async fn override_number(
    State(state): State<AppState>,
    admin: RequireAdmin,
    client: RequestClient,
    Path(id): Path<i64>,
    Json(request): Json<OverrideNumberRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.dispatch_no.trim().is_empty() {
        return Err(AppError::validation("dispatch_no is required"));
    }

    state
        .dispatches
        .override_number(DispatchId::new(id), &request.dispatch_no)
        .await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "dispatch",
                Some(id),
                json!({ "field": "dispatch_no", "new_value": request.dispatch_no }),
            )
            .with_origin(client.into_origin()),
        )
        .await;

    Ok(Json(
        json!({ "message": "dispatch number updated", "dispatch_no": request.dispatch_no }),
    ))
}

/// Delete a ticket (admin only).
pub async fn delete_dispatch(
    State(state): State<AppState>,
    admin: RequireAdmin,
    client: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.dispatches.delete(DispatchId::new(id)).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "dispatch",
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(client.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "dispatch deleted" })))
}
