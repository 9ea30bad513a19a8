//! `storefront-sales` — orders, the inventory ledger and the order workflow.
//!
//! The store the workflow runs against is an explicit collaborator
//! ([`SalesStore`]), so tests can substitute an in-memory fake.

pub mod error;
pub mod ledger;
pub mod order;
pub mod store;
pub mod workflow;

pub use error::SalesError;
pub use ledger::InventoryLedger;
pub use order::{Order, OrderStatus};
pub use store::{SalesStore, SalesTx, StockDecrement, StoreError};
pub use workflow::OrderWorkflow;
