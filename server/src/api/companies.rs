//! Company endpoints. RNC is mandatory; name and RNC are unique.

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::catalog::{Company, CompanyDraft};
use despacho_core::types::CompanyId;
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde_json::json;

/// List all companies.
pub async fn list_companies(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<Company>>>, AppError> {
    Ok(Json(DataResponse::new(state.companies.list().await?)))
}

/// Create a company (admin only). Duplicate name or RNC answers 409.
pub async fn create_company(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Json(draft): Json<CompanyDraft>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let new = draft.validate()?;
    let company = state.companies.create(new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Create,
                "company",
                Some(company.id.value()),
                json!({ "name": company.name, "rnc": company.rnc }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(company)))
}

/// Update a company (admin only).
pub async fn update_company(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(draft): Json<CompanyDraft>,
) -> Result<Json<Company>, AppError> {
    let new = draft.validate()?;
    let company = state.companies.update(CompanyId::new(id), new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "company",
                Some(id),
                json!({ "name": company.name }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(company))
}

/// Delete a company (admin only).
pub async fn delete_company(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.companies.delete(CompanyId::new(id)).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "company",
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "company deleted" })))
}
