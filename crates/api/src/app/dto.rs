//! Request/response DTOs and JSON mapping helpers.
//!
//! Response mapping is explicit so sensitive fields (`password_hash`) can
//! never leak through a derived `Serialize`.

use serde::Deserialize;
use serde_json::{Value, json};

use storefront_auth::{Role, User};
use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, Money, ProductId};
use storefront_sales::{Order, OrderStatus};

// ── requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock_quantity: i64,
    pub category_id: CategoryId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock_quantity: Option<i64>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
pub struct ReduceStockRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct EditOrderRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransitionStatusRequest {
    pub status: OrderStatus,
}

// ── responses ────────────────────────────────────────────────────────────

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "role": user.role.as_str(),
        "created_at": user.created_at,
    })
}

pub fn category_to_json(category: &Category) -> Value {
    json!({
        "id": category.id.to_string(),
        "name": category.name,
        "description": category.description,
    })
}

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id.to_string(),
        "name": product.name,
        "description": product.description,
        "price": product.price.to_string(),
        "stock_quantity": product.stock_quantity,
        "category_id": product.category_id.to_string(),
        "created_at": product.created_at,
    })
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id.to_string(),
        "user_id": order.user_id.to_string(),
        "product_id": order.product_id.to_string(),
        "quantity": order.quantity,
        "status": order.status.as_str(),
        "ordered_at": order.ordered_at,
    })
}
