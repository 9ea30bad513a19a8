//! Sales-layer error model.

use thiserror::Error;

use crate::order::OrderStatus;
use crate::store::StoreError;

/// Failures of the inventory ledger and order workflow.
///
/// All of these are recoverable at the caller's discretion; none should be
/// fatal to the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SalesError {
    /// Requested quantity was zero or negative.
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    /// Requested more units than the product has in stock.
    #[error("insufficient stock")]
    InsufficientStock,

    #[error("product not found")]
    ProductNotFound,

    #[error("order not found")]
    OrderNotFound,

    /// The order has left the state in which edits/deletes are allowed.
    #[error("order can no longer be modified (status: {0})")]
    NotEditable(OrderStatus),

    /// The requested status change is not an edge of the lifecycle.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A conditional write found no matching row: a concurrent writer won.
    /// Retry or reject, never ignore.
    #[error("concurrent modification detected")]
    ConcurrentModification,

    #[error(transparent)]
    Store(#[from] StoreError),
}
