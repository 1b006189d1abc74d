//! Identifiers and shared value objects.
//!
//! All entities use database-assigned numeric ids. Newtypes keep the ids
//! from being mixed up across entities at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw database id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw database id.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a dispatch ticket (the internal id, not the display number).
    DispatchId
);
entity_id!(
    /// Identifier of a user account.
    UserId
);
entity_id!(
    /// Identifier of a client.
    ClientId
);
entity_id!(
    /// Identifier of a company.
    CompanyId
);
entity_id!(
    /// Identifier of a product.
    ProductId
);
entity_id!(
    /// Identifier of a piece of equipment.
    EquipmentId
);
entity_id!(
    /// Identifier of an operator.
    OperatorId
);
entity_id!(
    /// Identifier of a truck.
    TruckId
);

/// Access role attached to a user account.
///
/// Reads are open to any authenticated user; mutations of catalog data,
/// settings, the audit trail and other users are restricted to [`Role::Admin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including settings, user management and overrides.
    Admin,
    /// Day-to-day access: create dispatches, read catalog data.
    Employee,
}

impl Role {
    /// Stable string form, matching the values stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }

    /// Whether this role may perform administrative mutations.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Parse the stored string form. Unknown values map to the least
    /// privileged role.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::Employee,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a free-text identity field the way the business writes tickets:
/// trimmed and uppercased. Returns `None` for blank input.
#[must_use]
pub fn normalize_upper(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        // Purely a compile-time property; spot-check the accessors.
        let id = DispatchId::new(7);
        assert_eq!(id.value(), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn role_round_trips_through_db_form() {
        assert_eq!(Role::from_db("admin"), Role::Admin);
        assert_eq!(Role::from_db("employee"), Role::Employee);
        assert_eq!(Role::Admin.as_str(), "admin");
        assert!(Role::Admin.is_admin());
        assert!(!Role::Employee.is_admin());
    }

    #[test]
    fn unknown_role_maps_to_employee() {
        assert_eq!(Role::from_db("superuser"), Role::Employee);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap_or_default();
        assert_eq!(json, "\"admin\"");
    }

    #[test]
    fn normalize_upper_trims_and_uppercases() {
        assert_eq!(normalize_upper("  abc-123 "), Some("ABC-123".to_string()));
        assert_eq!(normalize_upper("   "), None);
        assert_eq!(normalize_upper(""), None);
    }
}
