//! Application state shared across HTTP handlers.
//!
//! Stores are held as trait objects so the same handlers run over
//! `PostgreSQL` in production and over the in-memory fakes in tests.

use async_trait::async_trait;
use despacho_auth::Authenticator;
use despacho_core::audit::AuditEvent;
use despacho_core::environment::Clock;
use despacho_core::repository::{
    AuditStore, ClientStore, CompanyStore, DispatchStore, NamedEntityStore, ProductStore,
    SettingsStore, TruckStore,
};
use despacho_auth::providers::UserStore;
use std::sync::Arc;

/// Readiness probe for `/ready`: checks the dependency the deployment cares
/// about (the database, in production).
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Check readiness; the error string is logged, not exposed.
    async fn ready(&self) -> Result<(), String>;
}

/// Probe that always succeeds (tests, local smoke runs).
pub struct AlwaysReady;

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    async fn ready(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, via `Arc`s) for each request.
#[derive(Clone)]
pub struct AppState {
    /// The ticket ledger (allocation boundary included).
    pub dispatches: Arc<dyn DispatchStore>,
    /// Settings (the numbering floor).
    pub settings: Arc<dyn SettingsStore>,
    /// Clients.
    pub clients: Arc<dyn ClientStore>,
    /// Companies.
    pub companies: Arc<dyn CompanyStore>,
    /// Products and per-client prices.
    pub products: Arc<dyn ProductStore>,
    /// Equipment.
    pub equipment: Arc<dyn NamedEntityStore>,
    /// Operators.
    pub operators: Arc<dyn NamedEntityStore>,
    /// Truck fleet (read side).
    pub trucks: Arc<dyn TruckStore>,
    /// Audit trail.
    pub audit: Arc<dyn AuditStore>,
    /// User accounts.
    pub users: Arc<dyn UserStore>,
    /// Login and session validation.
    pub auth: Authenticator,
    /// Server clock (fixed in tests).
    pub clock: Arc<dyn Clock>,
    /// Readiness probe for `/ready`.
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Append an audit record.
    ///
    /// The trail is observational: a failed write is logged and swallowed so
    /// it never fails the operation it describes.
    pub async fn record_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event).await {
            tracing::warn!(error = %err, "audit write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_clone() {
        // Required by Axum's State extractor.
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
