//! Login, logout and current-user endpoints.

use crate::auth::CurrentUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use despacho_auth::{AuthError, User};
use despacho_core::audit::{AuditAction, AuditEvent};
use despacho_core::types::UserId;
use despacho_web::error::AppError;
use despacho_web::extractors::{BearerToken, RequestClient};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Login response: the bearer token (shown exactly once) plus the user.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Authenticate and issue a session.
///
/// Failed attempts are audited with the attempted username; the response
/// does not distinguish a wrong password from an unknown user.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3002/api/auth/login \
///   -H "Content-Type: application/json" \
///   -d '{ "username": "admin", "password": "admin123" }'
/// ```
pub async fn login(
    State(state): State<AppState>,
    client: RequestClient,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    metrics::counter!("despacho_login_attempts_total").increment(1);

    match state.auth.login(&request.username, &request.password).await {
        Ok(outcome) => {
            state
                .record_audit(
                    AuditEvent::new(
                        outcome.user.id,
                        outcome.user.username.clone(),
                        AuditAction::Login,
                        "session",
                        None,
                        json!({}),
                    )
                    .with_origin(client.into_origin()),
                )
                .await;

            Ok(Json(LoginResponse {
                token: outcome.token,
                user: outcome.user,
            }))
        }
        Err(err @ AuthError::InvalidCredentials) => {
            state
                .record_audit(
                    AuditEvent::new(
                        UserId::new(0),
                        request.username.clone(),
                        AuditAction::LoginFailed,
                        "session",
                        None,
                        json!({}),
                    )
                    .with_origin(client.into_origin()),
                )
                .await;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Revoke the presenting session.
pub async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    bearer: BearerToken,
) -> Result<Json<serde_json::Value>, AppError> {
    state.auth.logout(&bearer.0).await?;
    Ok(Json(json!({ "message": "logged out" })))
}

/// The current user behind the presented token.
#[allow(clippy::unused_async)]
pub async fn me(user: CurrentUser) -> Json<User> {
    Json(user.0.user)
}
