use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult};

/// A flat catalog grouping. Category names are unique across the store
/// (uniqueness is enforced by the persistence layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            name: name.trim().to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
        })
    }

    /// Apply a partial update, re-running validation.
    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        self.name = name.trim().to_string();
        Ok(())
    }
}
