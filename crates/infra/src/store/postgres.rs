//! Postgres-backed store.
//!
//! The stock decrement is a single conditional `UPDATE ... WHERE
//! stock_quantity >= $q`, so the sufficiency check and the write are one
//! atomic statement under row-level locking. Order writes share the sqlx
//! transaction, which rolls back on drop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use storefront_auth::{Role, User};
use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, Money, OrderId, ProductId, UserId};
use storefront_sales::{Order, OrderStatus, SalesStore, SalesTx, StockDecrement, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
        stock_quantity BIGINT NOT NULL CHECK (stock_quantity >= 0),
        category_id UUID NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        status TEXT NOT NULL,
        ordered_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist. Cascade deletes for the
    /// ownership edges (category→product, user→order, product→order) are
    /// declared here rather than re-implemented in queries.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        }
        tracing::info!("database schema ready");
        Ok(())
    }

    // ── users ────────────────────────────────────────────────────────────

    pub async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    pub async fn users(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .iter()
            .map(user_from_row)
            .collect()
    }

    pub async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, role = $4, password_hash = $5 \
             WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(())
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(())
    }

    // ── categories ───────────────────────────────────────────────────────

    pub async fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .map(|row| category_from_row(&row))
            .transpose()
    }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        sqlx::query("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .iter()
            .map(category_from_row)
            .collect()
    }

    pub async fn update_category(&self, category: Category) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
                .bind(category.id.as_uuid())
                .bind(&category.name)
                .bind(&category.description)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CategoryNotFound);
        }
        Ok(())
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CategoryNotFound);
        }
        Ok(())
    }

    // ── products ─────────────────────────────────────────────────────────

    pub async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let exists = sqlx::query("SELECT 1 FROM categories WHERE id = $1")
            .bind(product.category_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if exists.is_none() {
            return Err(StoreError::CategoryNotFound);
        }

        sqlx::query(
            "INSERT INTO products \
             (id, name, description, price_cents, stock_quantity, category_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.category_id.as_uuid())
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        sqlx::query("SELECT * FROM products ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .iter()
            .map(product_from_row)
            .collect()
    }

    pub async fn update_product(&self, product: Product) -> Result<(), StoreError> {
        let exists = sqlx::query("SELECT 1 FROM categories WHERE id = $1")
            .bind(product.category_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if exists.is_none() {
            return Err(StoreError::CategoryNotFound);
        }

        let result = sqlx::query(
            "UPDATE products SET name = $2, description = $3, price_cents = $4, \
             stock_quantity = $5, category_id = $6 WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.category_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound);
        }
        Ok(())
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound);
        }
        Ok(())
    }

    // ── orders ───────────────────────────────────────────────────────────

    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        sqlx::query("SELECT * FROM orders ORDER BY ordered_at")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .iter()
            .map(order_from_row)
            .collect()
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY ordered_at")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .iter()
            .map(order_from_row)
            .collect()
    }
}

#[async_trait]
impl SalesStore for PostgresStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .map(|row| product_from_row(&row))
            .transpose()
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .map(|row| order_from_row(&row))
            .transpose()
    }

    async fn begin(&self) -> Result<Box<dyn SalesTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

/// sqlx transactions roll back on drop, which is the whole rollback story
/// here.
struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SalesTx for PostgresTx {
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<StockDecrement, StoreError> {
        let updated = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - $2 \
             WHERE id = $1 AND stock_quantity >= $2 \
             RETURNING stock_quantity",
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        if let Some(row) = updated {
            let remaining: i64 = row.try_get("stock_quantity").map_err(map_sqlx_err)?;
            return Ok(StockDecrement::Applied { remaining });
        }

        // Zero rows: either the product is missing or stock was short.
        let current = sqlx::query("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_err)?;

        match current {
            Some(row) => Ok(StockDecrement::Insufficient {
                available: row.try_get("stock_quantity").map_err(map_sqlx_err)?,
            }),
            None => Err(StoreError::ProductNotFound),
        }
    }

    async fn restore_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + $2 WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound);
        }
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, product_id, quantity, status, ordered_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.product_id.as_uuid())
        .bind(order.quantity)
        .bind(order.status.as_str())
        .bind(order.ordered_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET quantity = $2, status = $3 WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(order.quantity)
        .bind(order.status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound);
        }
        Ok(())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx_err)
    }
}

fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        // 23505 unique_violation, 23503 foreign_key_violation
        if matches!(db.code().as_deref(), Some("23505") | Some("23503")) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Backend(e.to_string())
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = try_get(row, "role")?;
    Ok(User {
        id: UserId::from_uuid(try_get::<Uuid>(row, "id")?),
        username: try_get(row, "username")?,
        email: try_get(row, "email")?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        password_hash: try_get(row, "password_hash")?,
        created_at: try_get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: CategoryId::from_uuid(try_get::<Uuid>(row, "id")?),
        name: try_get(row, "name")?,
        description: try_get::<Option<String>>(row, "description")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(try_get::<Uuid>(row, "id")?),
        name: try_get(row, "name")?,
        description: try_get(row, "description")?,
        price: Money::from_cents(try_get::<i64>(row, "price_cents")?),
        stock_quantity: try_get::<i64>(row, "stock_quantity")?,
        category_id: CategoryId::from_uuid(try_get::<Uuid>(row, "category_id")?),
        created_at: try_get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = try_get(row, "status")?;
    Ok(Order {
        id: OrderId::from_uuid(try_get::<Uuid>(row, "id")?),
        user_id: UserId::from_uuid(try_get::<Uuid>(row, "user_id")?),
        product_id: ProductId::from_uuid(try_get::<Uuid>(row, "product_id")?),
        quantity: try_get::<i64>(row, "quantity")?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        ordered_at: try_get::<DateTime<Utc>>(row, "ordered_at")?,
    })
}

fn try_get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(column)
        .map_err(|e| StoreError::Backend(e.to_string()))
}
