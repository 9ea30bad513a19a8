use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use storefront_auth::Capability;
use storefront_core::OrderId;
use storefront_sales::Order;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/:id", get(get_order).put(edit_order).delete(delete_order))
        .route("/:id/total", get(order_total))
        .route("/:id/status", post(transition_status))
}

fn parse_order_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
    })
}

/// Owners see their own orders; everything else needs `ManageOrders`.
fn require_order_access(
    principal: &PrincipalContext,
    order: &Order,
) -> Result<(), axum::response::Response> {
    if order.user_id == principal.user_id() {
        return Ok(());
    }
    authz::require(principal, Capability::ManageOrders)
}

async fn load_order(
    services: &AppServices,
    id: OrderId,
) -> Result<Order, axum::response::Response> {
    match services.order(id).await {
        Ok(Some(order)) => Ok(order),
        Ok(None) => Err(errors::json_error(
            StatusCode::NOT_FOUND,
            "order_not_found",
            "order not found",
        )),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::PlaceOrders) {
        return response;
    }

    match services
        .place_order(principal.user_id(), body.product_id, body.quantity)
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, quantity = order.quantity, "order placed");
            (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response()
        }
        Err(e) => errors::sales_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let result = if principal.role().permits(Capability::ManageOrders) {
        services.orders().await
    } else {
        services.orders_for_user(principal.user_id()).await
    };

    match result {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let order = match load_order(&services, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };
    if let Err(response) = require_order_access(&principal, &order) {
        return response;
    }

    (StatusCode::OK, Json(dto::order_to_json(&order))).into_response()
}

pub async fn order_total(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let order = match load_order(&services, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };
    if let Err(response) = require_order_access(&principal, &order) {
        return response;
    }

    match services.order_total(id).await {
        Ok(total) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "order_id": id.to_string(),
                "total": total.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::sales_error_to_response(e),
    }
}

pub async fn transition_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionStatusRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageOrders) {
        return response;
    }

    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.transition_status(id, body.status).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, status = %order.status, "order status changed");
            (StatusCode::OK, Json(dto::order_to_json(&order))).into_response()
        }
        Err(e) => errors::sales_error_to_response(e),
    }
}

pub async fn edit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::EditOrderRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let order = match load_order(&services, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };
    if let Err(response) = require_order_access(&principal, &order) {
        return response;
    }

    match services.edit_order(id, body.quantity).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::sales_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let order = match load_order(&services, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };
    if let Err(response) = require_order_access(&principal, &order) {
        return response;
    }

    match services.delete_order(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::sales_error_to_response(e),
    }
}
