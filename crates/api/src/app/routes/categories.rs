use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use storefront_auth::Capability;
use storefront_catalog::Category;
use storefront_core::CategoryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let category = match Category::new(CategoryId::new(), body.name, body.description) {
        Ok(category) => category,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_category(category.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response()
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.categories().await {
        Ok(categories) => {
            let items: Vec<_> = categories.iter().map(dto::category_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid category id",
            );
        }
    };

    match services.category(id).await {
        Ok(Some(category)) => {
            (StatusCode::OK, Json(dto::category_to_json(&category))).into_response()
        }
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "category_not_found",
            "category not found",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCategoryRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid category id",
            );
        }
    };

    let existing = match services.category(id).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                "category_not_found",
                "category not found",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let updated = match Category::new(
        existing.id,
        body.name.unwrap_or(existing.name),
        body.description.or(existing.description),
    ) {
        Ok(category) => category,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_category(updated.clone()).await {
        Ok(()) => (StatusCode::OK, Json(dto::category_to_json(&updated))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageCatalog) {
        return response;
    }

    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid category id",
            );
        }
    };

    match services.delete_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
