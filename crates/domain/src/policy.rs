//! Centralized authorization policy.
//!
//! All role gating in the workspace goes through these two functions; no
//! service compares roles inline.

use common::{Principal, UserId};

use crate::error::DomainError;

/// Requires an administrative principal.
pub fn require_admin(principal: &Principal) -> Result<(), DomainError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Requires the principal to be the named user, or an admin.
pub fn require_self_or_admin(principal: &Principal, user_id: UserId) -> Result<(), DomainError> {
    if principal.user_id == user_id || principal.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use common::Role;

    use super::*;

    #[test]
    fn admin_passes_both_gates() {
        let admin = Principal::new(UserId::new(), Role::Admin);
        assert!(require_admin(&admin).is_ok());
        assert!(require_self_or_admin(&admin, UserId::new()).is_ok());
    }

    #[test]
    fn customer_fails_admin_gate() {
        let customer = Principal::new(UserId::new(), Role::Customer);
        assert!(matches!(
            require_admin(&customer),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn customer_passes_only_for_own_records() {
        let customer = Principal::new(UserId::new(), Role::Customer);
        assert!(require_self_or_admin(&customer, customer.user_id).is_ok());
        assert!(matches!(
            require_self_or_admin(&customer, UserId::new()),
            Err(DomainError::Forbidden)
        ));
    }
}
