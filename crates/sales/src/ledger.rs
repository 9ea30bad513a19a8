//! Inventory ledger: the stock-mutation rule.

use storefront_core::ProductId;

use crate::error::SalesError;
use crate::store::{SalesTx, StockDecrement, StoreError};

/// The one legal way stock decreases.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Reduce a product's stock by `quantity` within `tx`.
    ///
    /// Returns `Ok(true)` when the decrement was applied and `Ok(false)` when
    /// stock was insufficient (in which case nothing was written). The caller
    /// decides how to surface the shortfall.
    ///
    /// A non-positive quantity never reaches the store: accepting it would
    /// let "negative orders" mint stock.
    pub async fn reduce_stock(
        tx: &mut dyn SalesTx,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool, SalesError> {
        if quantity <= 0 {
            return Err(SalesError::InvalidQuantity);
        }

        match tx.decrement_stock(product_id, quantity).await {
            Ok(StockDecrement::Applied { .. }) => Ok(true),
            Ok(StockDecrement::Insufficient { .. }) => Ok(false),
            Err(StoreError::ProductNotFound) => Err(SalesError::ProductNotFound),
            Err(e) => Err(SalesError::Store(e)),
        }
    }
}
