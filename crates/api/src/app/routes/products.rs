use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use storefront_auth::Capability;
use storefront_catalog::Product;
use storefront_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/reduce", post(reduce_stock))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let product = match Product::new(
        ProductId::new(),
        body.name,
        body.description,
        body.price,
        body.stock_quantity,
        body.category_id,
        Utc::now(),
    ) {
        Ok(product) => product,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_product(product.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products().await {
        Ok(products) => {
            let items: Vec<_> = products.iter().map(dto::product_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.product(id).await {
        Ok(Some(product)) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "product_not_found",
            "product not found",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    let existing = match services.product(id).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                "product_not_found",
                "product not found",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let updated = match Product::new(
        existing.id,
        body.name.unwrap_or(existing.name),
        body.description.unwrap_or(existing.description),
        body.price.unwrap_or(existing.price),
        body.stock_quantity.unwrap_or(existing.stock_quantity),
        body.category_id.unwrap_or(existing.category_id),
        existing.created_at,
    ) {
        Ok(product) => product,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_product(updated.clone()).await {
        Ok(()) => (StatusCode::OK, Json(dto::product_to_json(&updated))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Direct stock reduction, detached from any order.
pub async fn reduce_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReduceStockRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.reduce_stock(id, body.quantity).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "reduced": true })),
        )
            .into_response(),
        Ok(false) => errors::json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            "insufficient stock",
        ),
        Err(e) => errors::sales_error_to_response(e),
    }
}
