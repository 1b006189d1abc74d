//! The handler error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`. Domain validation, storage
//! and auth errors convert into it via `From`, so handlers propagate with
//! `?` and the mapping to status codes lives in exactly one place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use despacho_auth::AuthError;
use despacho_core::error::{DomainError, StoreError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, a stable machine-readable code for clients, a
/// user-facing message, and an optional internal source that is logged but
/// never exposed.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error with an explicit status and code.
    #[must_use]
    pub const fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            code,
            message,
            source: None,
        }
    }

    /// Attach an internal source error (logged on 5xx, not exposed).
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message.into())
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.into())
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message.into())
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} with id {id} not found"),
        )
    }

    /// 409 Conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message.into())
    }

    /// 422 Unprocessable Entity.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            message.into(),
        )
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message.into(),
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "request failed"
                ),
            }
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Validation failures are client errors: the draft never reached storage.
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            StoreError::Duplicate { .. } => Self::conflict(err.to_string()),
            StoreError::Domain(domain) => domain.into(),
            StoreError::Backend(_) => {
                Self::internal("Storage operation failed").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::SessionExpired
            | AuthError::SessionNotFound => Self::unauthorized(err.to_string()),
            AuthError::InsufficientPermissions { .. } => Self::forbidden(err.to_string()),
            AuthError::DuplicateUsername { .. } => Self::conflict(err.to_string()),
            AuthError::UserNotFound => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            AuthError::PasswordTooShort { .. } | AuthError::UsernameRequired => {
                Self::validation(err.to_string())
            }
            AuthError::Hashing(_) | AuthError::Storage(_) => {
                Self::internal("Authentication backend failed")
                    .with_source(anyhow::Error::new(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = AppError::bad_request("Invalid plate filter");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid plate filter");
    }

    #[test]
    fn domain_errors_are_unprocessable() {
        let err: AppError = DomainError::MissingField { field: "plate" }.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound {
            entity: "dispatch",
            id: 9,
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        let err: AppError = StoreError::Duplicate {
            entity: "company",
            detail: "rnc".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_errors_split_between_401_and_403() {
        let unauthorized: AppError = AuthError::SessionExpired.into();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let forbidden: AppError = AuthError::InsufficientPermissions { required: "admin" }.into();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn backend_errors_hide_detail() {
        let err: AppError = StoreError::Backend("connection refused to 10.0.0.5".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The user-facing message must not leak backend detail.
        assert_eq!(err.to_string(), "[INTERNAL_SERVER_ERROR] Storage operation failed");
    }
}
