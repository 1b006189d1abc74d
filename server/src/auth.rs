//! Authentication extractors for API handlers.
//!
//! - [`CurrentUser`]: any valid session. Use as a handler parameter to
//!   require authentication.
//! - [`RequireAdmin`]: a valid session belonging to an admin. Rejects with
//!   403 *before* the handler body runs, so a forbidden request can never
//!   reach a mutation.
//!
//! # Usage
//!
//! ```ignore
//! async fn create_dispatch(
//!     State(state): State<AppState>,
//!     user: CurrentUser,
//!     Json(draft): Json<DispatchDraft>,
//! ) -> Result<Json<CreatedDispatch>, AppError> {
//!     // user.0.user.id is guaranteed valid here
//! }
//! ```

use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use despacho_auth::AuthenticatedUser;
use despacho_web::{error::AppError, extractors::BearerToken};

/// An authenticated caller (any role).
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let user = state.auth.authenticate(&bearer.0).await?;
        Ok(Self(user))
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(Self(user))
    }
}
