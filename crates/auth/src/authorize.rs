use thiserror::Error;

use storefront_core::UserId;

use crate::role::{Capability, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from transport: the API layer derives this from
/// verified token claims.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks {capability:?}")]
    Forbidden { role: Role, capability: Capability },
}

/// Authorize a principal for one capability.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, capability: Capability) -> Result<(), AuthzError> {
    if principal.role.permits(capability) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            capability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_every_check() {
        let principal = Principal {
            user_id: UserId::new(),
            role: Role::Admin,
        };
        assert!(authorize(&principal, Capability::ManageUsers).is_ok());
        assert!(authorize(&principal, Capability::ManageOrders).is_ok());
    }

    #[test]
    fn customer_is_denied_management_capabilities() {
        let principal = Principal {
            user_id: UserId::new(),
            role: Role::Customer,
        };
        assert!(authorize(&principal, Capability::PlaceOrders).is_ok());

        let err = authorize(&principal, Capability::ManageCatalog).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::Forbidden {
                role: Role::Customer,
                capability: Capability::ManageCatalog,
            }
        ));
    }
}
