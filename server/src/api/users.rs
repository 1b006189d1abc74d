//! User management endpoints (admin only, except listing).

use crate::api::DataResponse;
use crate::auth::{CurrentUser, RequireAdmin};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use despacho_auth::user::{hash_password, NewUser, User, MIN_PASSWORD_LEN};
use despacho_auth::AuthError;
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::types::{Role, UserId};
use despacho_web::error::AppError;
use despacho_web::extractors::RequestClient;
use serde::Deserialize;
use serde_json::json;

/// List all user accounts.
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DataResponse<Vec<User>>>, AppError> {
    Ok(Json(DataResponse::new(state.users.list().await?)))
}

/// Create-user request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Login name.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// Access role (defaults to employee).
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::Employee
}

/// Create a user (admin only).
pub async fn create_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let new = NewUser::create(&request.username, &request.password, request.role)?;
    let user = state.users.create(new).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Create,
                "user",
                Some(user.id.value()),
                json!({ "username": user.username, "role": user.role }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update-user request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New login name.
    pub username: String,
    /// New role.
    pub role: Role,
    /// New password; omit to keep the current one.
    pub password: Option<String>,
}

/// Update a user (admin only).
pub async fn update_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AuthError::UsernameRequired.into());
    }

    let password_hash = match request.password.as_deref() {
        Some(password) => {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(AuthError::PasswordTooShort {
                    min: MIN_PASSWORD_LEN,
                }
                .into());
            }
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = state
        .users
        .update(
            UserId::new(id),
            username,
            request.role,
            password_hash.as_deref(),
        )
        .await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Update,
                "user",
                Some(id),
                json!({
                    "username": user.username,
                    "role": user.role,
                    "password_changed": password_hash.is_some(),
                }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(user))
}

/// Delete a user (admin only). Self-deletion is refused so the last admin
/// cannot lock everyone out mid-session.
pub async fn delete_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    origin: RequestClient,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if admin.0.user.id.value() == id {
        return Err(AppError::validation("cannot delete your own account"));
    }

    state.users.delete(UserId::new(id)).await?;

    state
        .record_audit(
            AuditEvent::new(
                admin.0.user.id,
                admin.0.user.username.clone(),
                AuditAction::Delete,
                "user",
                Some(id),
                json!({ "deleted_id": id }),
            )
            .with_origin(origin.into_origin()),
        )
        .await;

    Ok(Json(json!({ "message": "user deleted" })))
}
