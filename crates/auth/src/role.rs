use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Account role. A closed set: policy decisions are made by mapping a role to
/// its capabilities, never by matching on role names elsewhere.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

/// An operation a caller may be permitted to perform.
///
/// Checked once, at the API boundary, before any service call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create/update/delete user accounts and list all users.
    ManageUsers,
    /// Create/update/delete categories and products, including direct stock
    /// reductions.
    ManageCatalog,
    /// Inspect and transition any order.
    ManageOrders,
    /// Place orders and edit/delete one's own pending orders.
    PlaceOrders,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }

    /// The full capability set granted by this role.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::ManageUsers,
                Capability::ManageCatalog,
                Capability::ManageOrders,
                Capability::PlaceOrders,
            ],
            Role::Customer => &[Capability::PlaceOrders],
        }
    }

    pub fn permits(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
