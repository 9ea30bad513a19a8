use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::DomainError;
use storefront_sales::{SalesError, StoreError};

pub fn sales_error_to_response(err: SalesError) -> axum::response::Response {
    match err {
        SalesError::InvalidQuantity => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", err.to_string())
        }
        SalesError::InsufficientStock => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        SalesError::ProductNotFound => {
            json_error(StatusCode::NOT_FOUND, "product_not_found", err.to_string())
        }
        SalesError::OrderNotFound => {
            json_error(StatusCode::NOT_FOUND, "order_not_found", err.to_string())
        }
        SalesError::NotEditable(_) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "order_not_editable",
            err.to_string(),
        ),
        SalesError::InvalidStatusTransition { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_status_transition",
            err.to_string(),
        ),
        SalesError::ConcurrentModification => json_error(
            StatusCode::CONFLICT,
            "concurrent_modification",
            err.to_string(),
        ),
        SalesError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::ProductNotFound => {
            json_error(StatusCode::NOT_FOUND, "product_not_found", err.to_string())
        }
        StoreError::OrderNotFound => {
            json_error(StatusCode::NOT_FOUND, "order_not_found", err.to_string())
        }
        StoreError::CategoryNotFound => {
            json_error(StatusCode::NOT_FOUND, "category_not_found", err.to_string())
        }
        StoreError::UserNotFound => {
            json_error(StatusCode::NOT_FOUND, "user_not_found", err.to_string())
        }
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Backend(msg) => {
            tracing::error!("storage backend error: {msg}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "storage backend error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
