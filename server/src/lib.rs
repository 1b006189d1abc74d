//! Despacho server: the HTTP application for dispatch administration.
//!
//! This crate assembles the pieces: configuration from the environment,
//! store wiring over `PostgreSQL` (or the in-memory fakes in tests), the
//! authentication extractors, and the API handlers behind an Axum router.
//!
//! # Request flow
//!
//! ```text
//! HTTP request
//!   → CORS / correlation-ID layers        (despacho-web)
//!   → auth extractor (CurrentUser / RequireAdmin)
//!   → handler: validate draft             (despacho-core, pure)
//!   → store call                          (despacho-postgres)
//!   → audit record (observational)
//!   → JSON response or AppError
//! ```
//!
//! The dispatch-creation handler is the one endpoint with more than CRUD in
//! it: it resolves the server-side ticket date/time, validates the draft
//! before any number can be consumed, and delegates allocation to the
//! store's serialized boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
