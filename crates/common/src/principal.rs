//! Principals and roles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserId;

/// Role attached to a user account.
///
/// Closed two-variant enumeration; all authorization decisions go through
/// the domain policy functions rather than string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular account: may browse, order, and review.
    #[default]
    Customer,

    /// Administrative account: may manage orders for everyone.
    Admin,
}

impl Role {
    /// Returns the role name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// The authenticated actor performing an operation.
///
/// Every core operation takes an explicit principal; there is no ambient
/// "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The authenticated user's id.
    pub user_id: UserId,
    /// The role carried by the bearer token.
    pub role: Role,
}

impl Principal {
    /// Creates a principal for a user and role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns true for administrative principals.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_roundtrip() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Role::Customer).unwrap(),
            "\"customer\""
        );
    }

    #[test]
    fn principal_admin_check() {
        let admin = Principal::new(UserId::new(), Role::Admin);
        let customer = Principal::new(UserId::new(), Role::Customer);
        assert!(admin.is_admin());
        assert!(!customer.is_admin());
    }
}
