//! # Despacho Authentication & Authorization
//!
//! Credential login and opaque session tokens for the dispatch backend,
//! with the two-role model the business runs on (`admin` / `employee`).
//!
//! ## Design
//!
//! - **Opaque bearer tokens**: 32 bytes of OS randomness, URL-safe base64 on
//!   the wire, SHA-256 hashed at rest. A database dump never reveals a live
//!   token.
//! - **bcrypt passwords**: verified in constant time relative to the stored
//!   hash; unknown usernames burn an equivalent verification so login timing
//!   does not leak which usernames exist.
//! - **Provider traits**: [`providers::UserStore`] and
//!   [`providers::SessionStore`] abstract storage; `despacho-postgres`
//!   implements them, [`mocks`] hold the in-memory doubles used by tests.
//!
//! ## Example
//!
//! ```ignore
//! use despacho_auth::Authenticator;
//!
//! let auth = Authenticator::new(users, sessions, clock, chrono::Duration::days(7));
//! let login = auth.login("admin", "admin123").await?;
//! let current = auth.authenticate(&login.token).await?;
//! assert!(current.user.role.is_admin());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
#[cfg(feature = "test-utils")]
pub mod mocks;
pub mod providers;
pub mod service;
pub mod token;
pub mod user;

// Re-export main types for convenience
pub use error::{AuthError, Result};
pub use service::{AuthenticatedUser, Authenticator, LoginOutcome};
pub use user::{NewUser, User, UserRecord};
