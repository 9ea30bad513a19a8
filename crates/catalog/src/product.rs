use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, Money, ProductId};

/// A sellable catalog item.
///
/// # Invariants
/// - `price` is never negative.
/// - `stock_quantity` is never negative; the only way stock decreases is the
///   conditional decrement in the sales layer.
/// - A product belongs to exactly one category; deleting the category deletes
///   the product (persistence-layer cascade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock_quantity: i64,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock_quantity: i64,
        category_id: CategoryId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if price.is_negative() {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if stock_quantity < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }

        Ok(Self {
            id,
            name: name.trim().to_string(),
            description: description.into(),
            price,
            stock_quantity,
            category_id,
            created_at,
        })
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}
