//! Audit trail: who did what, to which entity, from where.
//!
//! Every mutation handler records an [`AuditEvent`]; the trail itself is
//! observational: a failed audit write is logged but never fails the
//! operation it describes.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// An entity was created.
    Create,
    /// An entity was updated.
    Update,
    /// An entity was deleted.
    Delete,
    /// A user logged in.
    Login,
    /// A login attempt failed.
    LoginFailed,
}

impl AuditAction {
    /// Stable string form, matching the values stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Login => "LOGIN",
            Self::LoginFailed => "LOGIN_FAILED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request metadata captured alongside an audit event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    /// Client IP, as seen through proxy headers.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// A new audit record, ready to append.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Acting user.
    pub user_id: UserId,
    /// Acting username, denormalized so the trail survives user deletion.
    pub username: String,
    /// What happened.
    pub action: AuditAction,
    /// Entity kind, e.g. `dispatch`, `company`.
    pub entity_type: String,
    /// Entity id, when one exists.
    pub entity_id: Option<i64>,
    /// Change summary as JSON.
    pub changes: serde_json::Value,
    /// Where the request came from.
    pub origin: RequestOrigin,
}

impl AuditEvent {
    /// Build an event for an entity mutation.
    #[must_use]
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Option<i64>,
        changes: serde_json::Value,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            action,
            entity_type: entity_type.into(),
            entity_id,
            changes,
            origin: RequestOrigin::default(),
        }
    }

    /// Attach request origin metadata.
    #[must_use]
    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// A persisted audit record, as read back for the admin view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Storage id.
    pub id: i64,
    /// Acting user.
    pub user_id: UserId,
    /// Acting username at the time of the event.
    pub username: String,
    /// What happened.
    pub action: String,
    /// Entity kind.
    pub entity_type: String,
    /// Entity id, when one exists.
    pub entity_id: Option<i64>,
    /// Change summary as JSON.
    pub changes: serde_json::Value,
    /// Client IP.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_string_forms_are_stable() {
        assert_eq!(AuditAction::Create.as_str(), "CREATE");
        assert_eq!(AuditAction::LoginFailed.as_str(), "LOGIN_FAILED");
    }

    #[test]
    fn event_builder_attaches_origin() {
        let event = AuditEvent::new(
            UserId::new(1),
            "admin",
            AuditAction::Update,
            "dispatch",
            Some(42),
            json!({ "field": "dispatch_no", "new_value": "0009999" }),
        )
        .with_origin(RequestOrigin {
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("curl/8".to_string()),
        });

        assert_eq!(event.entity_type, "dispatch");
        assert_eq!(event.origin.ip_address.as_deref(), Some("203.0.113.9"));
    }
}
