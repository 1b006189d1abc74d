//! Audit trail endpoints (admin only).

use crate::api::DataResponse;
use crate::auth::RequireAdmin;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use despacho_core::audit::AuditRecord;
use despacho_core::types::UserId;
use despacho_web::error::AppError;
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// Query parameters for the audit listing.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Maximum entries to return (default 100, cap 1000).
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Most recent audit entries.
pub async fn recent(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<AuditQuery>,
) -> Result<Json<DataResponse<Vec<AuditRecord>>>, AppError> {
    let rows = state.audit.recent(clamp_limit(query.limit)).await?;
    Ok(Json(DataResponse::new(rows)))
}

/// Audit entries for one user.
pub async fn by_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i64>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<DataResponse<Vec<AuditRecord>>>, AppError> {
    let rows = state
        .audit
        .by_user(UserId::new(id), clamp_limit(query.limit))
        .await?;
    Ok(Json(DataResponse::new(rows)))
}

/// Audit entries for one entity.
pub async fn by_entity(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((entity_type, id)): Path<(String, i64)>,
) -> Result<Json<DataResponse<Vec<AuditRecord>>>, AppError> {
    let rows = state.audit.by_entity(&entity_type, id).await?;
    Ok(Json(DataResponse::new(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(1_000_000)), 1000);
    }
}
