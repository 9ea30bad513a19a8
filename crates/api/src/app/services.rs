//! Infrastructure wiring: store backend selection + service facade.

use std::sync::Arc;

use storefront_auth::User;
use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, Money, OrderId, ProductId, UserId};
use storefront_infra::{InMemoryStore, PostgresStore};
use storefront_sales::{Order, OrderStatus, OrderWorkflow, SalesError, SalesStore, StoreError};

/// Backend-erased service facade handed to the route handlers.
pub enum AppServices {
    InMemory { store: Arc<InMemoryStore> },
    Persistent { store: Arc<PostgresStore> },
}

/// Pick the backend from the environment: in-memory by default,
/// Postgres when `USE_PERSISTENT_STORES=true` (requires `DATABASE_URL`).
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let pool = sqlx::PgPool::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");

        let store = PostgresStore::new(pool);
        store
            .migrate()
            .await
            .expect("failed to run schema migration");

        tracing::info!("using postgres-backed store");
        AppServices::Persistent {
            store: Arc::new(store),
        }
    } else {
        tracing::info!("using in-memory store");
        AppServices::InMemory {
            store: Arc::new(InMemoryStore::new()),
        }
    }
}

macro_rules! with_store {
    ($self:expr, $store:ident => $body:expr) => {
        match $self {
            AppServices::InMemory { store: $store } => $body,
            AppServices::Persistent { store: $store } => $body,
        }
    };
}

impl AppServices {
    // ── users ────────────────────────────────────────────────────────────

    pub async fn create_user(&self, user: User) -> Result<(), StoreError> {
        with_store!(self, store => store.insert_user(user).await)
    }

    pub async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        with_store!(self, store => store.user(id).await)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        with_store!(self, store => store.user_by_username(username).await)
    }

    pub async fn users(&self) -> Result<Vec<User>, StoreError> {
        with_store!(self, store => store.users().await)
    }

    pub async fn update_user(&self, user: User) -> Result<(), StoreError> {
        with_store!(self, store => store.update_user(user).await)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        with_store!(self, store => store.delete_user(id).await)
    }

    // ── categories ───────────────────────────────────────────────────────

    pub async fn create_category(&self, category: Category) -> Result<(), StoreError> {
        with_store!(self, store => store.insert_category(category).await)
    }

    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        with_store!(self, store => store.category(id).await)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        with_store!(self, store => store.categories().await)
    }

    pub async fn update_category(&self, category: Category) -> Result<(), StoreError> {
        with_store!(self, store => store.update_category(category).await)
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        with_store!(self, store => store.delete_category(id).await)
    }

    // ── products ─────────────────────────────────────────────────────────

    pub async fn create_product(&self, product: Product) -> Result<(), StoreError> {
        with_store!(self, store => store.insert_product(product).await)
    }

    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        with_store!(self, store => SalesStore::product(store.as_ref(), id).await)
    }

    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        with_store!(self, store => store.products().await)
    }

    pub async fn update_product(&self, product: Product) -> Result<(), StoreError> {
        with_store!(self, store => store.update_product(product).await)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        with_store!(self, store => store.delete_product(id).await)
    }

    // ── orders ───────────────────────────────────────────────────────────

    pub async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        with_store!(self, store => SalesStore::order(store.as_ref(), id).await)
    }

    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        with_store!(self, store => store.orders().await)
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        with_store!(self, store => store.orders_for_user(user_id).await)
    }

    // ── order workflow ───────────────────────────────────────────────────

    pub async fn place_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Order, SalesError> {
        with_store!(self, store => {
            OrderWorkflow::new(store.clone())
                .place_order(user_id, product_id, quantity)
                .await
        })
    }

    pub async fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool, SalesError> {
        with_store!(self, store => {
            OrderWorkflow::new(store.clone())
                .reduce_stock(product_id, quantity)
                .await
        })
    }

    pub async fn order_total(&self, order_id: OrderId) -> Result<Money, SalesError> {
        with_store!(self, store => OrderWorkflow::new(store.clone()).order_total(order_id).await)
    }

    pub async fn transition_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, SalesError> {
        with_store!(self, store => {
            OrderWorkflow::new(store.clone())
                .transition_status(order_id, next)
                .await
        })
    }

    pub async fn edit_order(
        &self,
        order_id: OrderId,
        new_quantity: i64,
    ) -> Result<Order, SalesError> {
        with_store!(self, store => {
            OrderWorkflow::new(store.clone())
                .edit_order(order_id, new_quantity)
                .await
        })
    }

    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), SalesError> {
        with_store!(self, store => OrderWorkflow::new(store.clone()).delete_order(order_id).await)
    }
}
