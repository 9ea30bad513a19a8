//! `storefront-api` — HTTP gateway over the catalog, sales and auth layers.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
