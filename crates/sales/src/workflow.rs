//! Order workflow: placing, totalling, transitioning, editing and deleting
//! orders, always atomically with their stock effects.

use std::sync::Arc;

use chrono::Utc;

use storefront_core::{Money, OrderId, ProductId, UserId};

use crate::error::SalesError;
use crate::ledger::InventoryLedger;
use crate::order::{Order, OrderStatus};
use crate::store::SalesStore;

/// Coordinates the inventory ledger and the order records over one store.
///
/// Every mutating operation runs inside a single store transaction: either
/// all of its writes persist, or none do.
pub struct OrderWorkflow<S> {
    store: Arc<S>,
}

impl<S> Clone for OrderWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SalesStore> OrderWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Place an order: conditionally decrement stock, then insert the order,
    /// in one transaction. On any failure nothing is persisted.
    pub async fn place_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Order, SalesError> {
        if quantity <= 0 {
            return Err(SalesError::InvalidQuantity);
        }

        let mut tx = self.store.begin().await?;

        if !InventoryLedger::reduce_stock(tx.as_mut(), product_id, quantity).await? {
            // Dropping the uncommitted transaction rolls back (no writes yet).
            return Err(SalesError::InsufficientStock);
        }

        let order = Order::new(OrderId::new(), user_id, product_id, quantity, Utc::now())
            .map_err(|_| SalesError::InvalidQuantity)?;
        tx.insert_order(&order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Stand-alone stock reduction (no order attached).
    ///
    /// `Ok(true)` when applied, `Ok(false)` when stock was insufficient.
    pub async fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool, SalesError> {
        let mut tx = self.store.begin().await?;
        let applied = InventoryLedger::reduce_stock(tx.as_mut(), product_id, quantity).await?;
        if applied {
            tx.commit().await?;
        }
        Ok(applied)
    }

    /// Exact order total: quantity times the product's current price.
    pub async fn order_total(&self, order_id: OrderId) -> Result<Money, SalesError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(SalesError::OrderNotFound)?;
        let product = self
            .store
            .product(order.product_id)
            .await?
            .ok_or(SalesError::ProductNotFound)?;

        order
            .total(product.price)
            .ok_or(SalesError::InvalidQuantity)
    }

    /// Move an order along its lifecycle.
    ///
    /// The write is conditional on the status observed here; if a concurrent
    /// writer got there first the operation fails with
    /// [`SalesError::ConcurrentModification`] instead of silently clobbering.
    /// Cancelling restores the order's quantity to product stock.
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, SalesError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(SalesError::OrderNotFound)?;

        if !order.status.can_transition_to(next) {
            return Err(SalesError::InvalidStatusTransition {
                from: order.status,
                to: next,
            });
        }

        let mut tx = self.store.begin().await?;
        if !tx.set_order_status(order_id, order.status, next).await? {
            return Err(SalesError::ConcurrentModification);
        }
        if next == OrderStatus::Cancelled {
            tx.restore_stock(order.product_id, order.quantity).await?;
        }
        tx.commit().await?;

        Ok(Order { status: next, ..order })
    }

    /// Change the quantity of a pending order, adjusting stock by the delta.
    pub async fn edit_order(
        &self,
        order_id: OrderId,
        new_quantity: i64,
    ) -> Result<Order, SalesError> {
        if new_quantity <= 0 {
            return Err(SalesError::InvalidQuantity);
        }

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(SalesError::OrderNotFound)?;
        if !order.is_modifiable() {
            return Err(SalesError::NotEditable(order.status));
        }

        let delta = new_quantity - order.quantity;
        let mut tx = self.store.begin().await?;

        if delta > 0 {
            if !InventoryLedger::reduce_stock(tx.as_mut(), order.product_id, delta).await? {
                return Err(SalesError::InsufficientStock);
            }
        } else if delta < 0 {
            tx.restore_stock(order.product_id, -delta).await?;
        }

        let updated = Order {
            quantity: new_quantity,
            ..order
        };
        tx.update_order(&updated).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a pending order and return its units to stock.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), SalesError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(SalesError::OrderNotFound)?;
        if !order.is_modifiable() {
            return Err(SalesError::NotEditable(order.status));
        }

        let mut tx = self.store.begin().await?;
        tx.restore_stock(order.product_id, order.quantity).await?;
        tx.delete_order(order_id).await?;
        tx.commit().await?;

        Ok(())
    }
}
