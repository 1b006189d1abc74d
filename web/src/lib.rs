//! Axum integration for the dispatch backend.
//!
//! The HTTP layer is the imperative shell around the functional core in
//! `despacho-core`: handlers extract and validate input, call a store or the
//! allocator boundary, and map the result (or error) back onto HTTP.
//!
//! This crate holds the pieces that are independent of any particular
//! endpoint:
//!
//! - [`AppError`]: one error type for every handler, carrying an HTTP status,
//!   a machine-readable code, a user-facing message and an internal source.
//!   Domain, storage and auth errors convert into it with `?`.
//! - Extractors: [`extractors::BearerToken`], [`extractors::ClientIp`],
//!   [`extractors::RequestClient`] (IP + user agent for the audit trail) and
//!   [`extractors::CorrelationId`].
//! - Middleware: the correlation-ID layer (header in, span, header out) and
//!   the CORS layer built from the configured origin allow-list.
//!
//! The application itself (state, routes, endpoint handlers) lives in
//! `despacho-server`, following the same split the HTTP layer has from the
//! domain.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, ClientIp, CorrelationId, RequestClient};
pub use middleware::{correlation_id_layer, cors_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
