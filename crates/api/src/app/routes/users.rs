use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use storefront_auth::{Capability, User, hash_password};
use storefront_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageUsers) {
        return response;
    }

    if body.password.len() < 8 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "password must be at least 8 characters long",
        );
    }

    let password_hash = match hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "failed to process password",
            );
        }
    };

    let user = match User::new(
        UserId::new(),
        body.username,
        body.email,
        body.role,
        password_hash,
        Utc::now(),
    ) {
        Ok(user) => user,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_user(user.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response()
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageUsers) {
        return response;
    }

    match services.users().await {
        Ok(users) => {
            let items: Vec<_> = users.iter().map(dto::user_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageUsers) {
        return response;
    }

    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    match services.user(id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "user_not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageUsers) {
        return response;
    }

    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    let existing = match services.user(id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "user_not_found", "user not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let password_hash = match body.password {
        Some(password) => {
            if password.len() < 8 {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "password must be at least 8 characters long",
                );
            }
            match hash_password(&password) {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::error!("password hashing failed: {e}");
                    return errors::json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "hash_error",
                        "failed to process password",
                    );
                }
            }
        }
        None => existing.password_hash.clone(),
    };

    // Rebuild through the validating constructor so updates obey the same
    // rules as creation.
    let updated = match User::new(
        existing.id,
        body.username.unwrap_or(existing.username),
        body.email.unwrap_or(existing.email),
        body.role.unwrap_or(existing.role),
        password_hash,
        existing.created_at,
    ) {
        Ok(user) => user,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_user(updated.clone()).await {
        Ok(()) => (StatusCode::OK, Json(dto::user_to_json(&updated))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(response) = authz::require(&principal, Capability::ManageUsers) {
        return response;
    }

    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id");
        }
    };

    match services.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
