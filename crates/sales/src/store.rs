//! Store surface consumed by the sales layer.
//!
//! Implementations live in `storefront-infra`; the traits live here so the
//! ledger and workflow can be exercised against an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use storefront_catalog::Product;
use storefront_core::{OrderId, ProductId};

use crate::order::{Order, OrderStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("product not found")]
    ProductNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error("user not found")]
    UserNotFound,

    /// A uniqueness or referential constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockDecrement {
    /// The decrement was applied; `remaining` units are left.
    Applied { remaining: i64 },
    /// Stock was insufficient; nothing was written.
    Insufficient { available: i64 },
}

/// Read/transaction surface the sales layer depends on.
#[async_trait]
pub trait SalesStore: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Begin a transaction. Dropping the returned handle without calling
    /// [`SalesTx::commit`] rolls back every write made through it.
    async fn begin(&self) -> Result<Box<dyn SalesTx>, StoreError>;
}

/// Writes within one all-or-nothing transaction scope.
#[async_trait]
pub trait SalesTx: Send {
    /// Decrement stock only if `stock_quantity >= quantity`, as one atomic
    /// step. The check and the write must not be separable by a concurrent
    /// transaction.
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<StockDecrement, StoreError>;

    /// Unconditionally add units back to stock.
    async fn restore_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Conditionally set an order's status; `false` means the stored status
    /// no longer matched `expected` (a concurrent writer won).
    async fn set_order_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, StoreError>;

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
