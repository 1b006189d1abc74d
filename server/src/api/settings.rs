//! Settings endpoints: the numbering-floor surface.
//!
//! `dispatch_start_number` is the one structured key. Raising it
//! fast-forwards the sequence on the very next allocation; lowering it is a
//! no-op once a higher number has been issued. The write path validates the
//! invariant (integer ≥ 1); the allocator's read path treats an unreadable
//! value as 1.

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::settings::{validate_setting, Setting};
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde::Deserialize;
use serde_json::json;

/// List all settings.
pub async fn list_settings(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<Setting>>>, AppError> {
    Ok(Json(DataResponse::new(state.settings.list().await?)))
}

/// Get one setting by key.
pub async fn get_setting(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(key): Path<String>,
) -> Result<Json<Setting>, AppError> {
    Ok(Json(state.settings.get(&key).await?))
}

/// Set-setting request.
#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    /// The new raw value.
    pub value: String,
}

/// Update a setting (admin only).
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:3002/api/settings/dispatch_start_number \
///   -H "Authorization: Bearer <admin token>" \
///   -H "Content-Type: application/json" \
///   -d '{ "value": "5000" }'
/// ```
pub async fn put_setting(
    State(state): State<AppState>,
    admin: RequireAdmin,
    client: RequestClient,
    Path(key): Path<String>,
    Json(request): Json<SetSettingRequest>,
) -> Result<Json<Setting>, AppError> {
    validate_setting(&key, &request.value)?;

    let setting = state.settings.set(&key, &request.value).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "setting",
                Some(setting.id),
                json!({ "key": key, "new_value": request.value }),
            )
            .with_origin(client.into_origin()),
        )
        .await;

    Ok(Json(setting))
}
