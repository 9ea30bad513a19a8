//! In-memory store.
//!
//! Intended for tests/dev. Not optimized for performance: every transaction
//! holds the single store lock for its lifetime, which is exactly what makes
//! the conditional stock decrement atomic here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use storefront_auth::User;
use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, OrderId, ProductId, UserId};
use storefront_sales::{Order, OrderStatus, SalesStore, SalesTx, StockDecrement, StoreError};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── users ────────────────────────────────────────────────────────────

    pub async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    pub async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    pub async fn users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state.lock().await;
        let mut users: Vec<_> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    pub async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::UserNotFound);
        }
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    /// Delete a user; their orders go with them.
    pub async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.users.remove(&id).ok_or(StoreError::UserNotFound)?;
        state.orders.retain(|_, o| o.user_id != id);
        Ok(())
    }

    // ── categories ───────────────────────────────────────────────────────

    pub async fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.state.lock().await.categories.get(&id).cloned())
    }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let state = self.state.lock().await;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub async fn update_category(&self, category: Category) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&category.id) {
            return Err(StoreError::CategoryNotFound);
        }
        if state
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(StoreError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    /// Delete a category and cascade to its products (and their orders):
    /// removing a classification removes its inventory.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .categories
            .remove(&id)
            .ok_or(StoreError::CategoryNotFound)?;

        let doomed: Vec<ProductId> = state
            .products
            .values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();
        for product_id in &doomed {
            state.products.remove(product_id);
        }
        state.orders.retain(|_, o| !doomed.contains(&o.product_id));
        Ok(())
    }

    // ── products ─────────────────────────────────────────────────────────

    pub async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&product.category_id) {
            return Err(StoreError::CategoryNotFound);
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.to_string().cmp(&b.id.to_string())));
        Ok(products)
    }

    pub async fn update_product(&self, product: Product) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product.id) {
            return Err(StoreError::ProductNotFound);
        }
        if !state.categories.contains_key(&product.category_id) {
            return Err(StoreError::CategoryNotFound);
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.products.remove(&id).ok_or(StoreError::ProductNotFound)?;
        state.orders.retain(|_, o| o.product_id != id);
        Ok(())
    }

    // ── orders ───────────────────────────────────────────────────────────

    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.ordered_at);
        Ok(orders)
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.ordered_at);
        Ok(orders)
    }
}

#[async_trait]
impl SalesStore for InMemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn SalesTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryTx {
            guard,
            undo: Vec::new(),
            committed: false,
        }))
    }
}

enum Undo {
    AddStock { product_id: ProductId, quantity: i64 },
    RemoveStock { product_id: ProductId, quantity: i64 },
    RemoveOrder(OrderId),
    PutOrder(Order),
}

/// Transaction over the in-memory store.
///
/// Holds the store lock for its lifetime and keeps an undo log; dropping the
/// transaction without committing reverts every write in reverse order.
struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    undo: Vec<Undo>,
    committed: bool,
}

#[async_trait]
impl SalesTx for InMemoryTx {
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<StockDecrement, StoreError> {
        let product = self
            .guard
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound)?;

        if product.stock_quantity >= quantity {
            product.stock_quantity -= quantity;
            self.undo.push(Undo::AddStock {
                product_id,
                quantity,
            });
            Ok(StockDecrement::Applied {
                remaining: product.stock_quantity,
            })
        } else {
            Ok(StockDecrement::Insufficient {
                available: product.stock_quantity,
            })
        }
    }

    async fn restore_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let product = self
            .guard
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound)?;
        product.stock_quantity += quantity;
        self.undo.push(Undo::RemoveStock {
            product_id,
            quantity,
        });
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.guard.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        if !self.guard.users.contains_key(&order.user_id) {
            return Err(StoreError::Conflict(
                "order references a missing user".to_string(),
            ));
        }
        if !self.guard.products.contains_key(&order.product_id) {
            return Err(StoreError::Conflict(
                "order references a missing product".to_string(),
            ));
        }

        self.guard.orders.insert(order.id, order.clone());
        self.undo.push(Undo::RemoveOrder(order.id));
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let previous = self
            .guard
            .orders
            .get(&order.id)
            .cloned()
            .ok_or(StoreError::OrderNotFound)?;
        self.guard.orders.insert(order.id, order.clone());
        self.undo.push(Undo::PutOrder(previous));
        Ok(())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, StoreError> {
        let Some(order) = self.guard.orders.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != expected {
            return Ok(false);
        }

        let previous = order.clone();
        order.status = next;
        self.undo.push(Undo::PutOrder(previous));
        Ok(true)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        let previous = self
            .guard
            .orders
            .remove(&id)
            .ok_or(StoreError::OrderNotFound)?;
        self.undo.push(Undo::PutOrder(previous));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.committed = true;
        self.undo.clear();
        Ok(())
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(op) = self.undo.pop() {
            match op {
                Undo::AddStock {
                    product_id,
                    quantity,
                } => {
                    if let Some(p) = self.guard.products.get_mut(&product_id) {
                        p.stock_quantity += quantity;
                    }
                }
                Undo::RemoveStock {
                    product_id,
                    quantity,
                } => {
                    if let Some(p) = self.guard.products.get_mut(&product_id) {
                        p.stock_quantity -= quantity;
                    }
                }
                Undo::RemoveOrder(id) => {
                    self.guard.orders.remove(&id);
                }
                Undo::PutOrder(order) => {
                    self.guard.orders.insert(order.id, order);
                }
            }
        }
    }
}
