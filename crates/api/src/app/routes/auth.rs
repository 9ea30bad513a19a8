//! Signup and login. The only routes that handle raw passwords.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use storefront_auth::{Role, TokenCodec, User, hash_password, verify_password};
use storefront_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

fn validate_password(password: &str) -> Result<(), axum::response::Response> {
    if password.len() < 8 {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "password must be at least 8 characters long",
        ));
    }
    Ok(())
}

/// Self-service registration. Always creates a customer; admin accounts are
/// provisioned through the users API.
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    Json(body): Json<dto::SignupRequest>,
) -> axum::response::Response {
    if let Err(response) = validate_password(&body.password) {
        return response;
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
        Role::Customer,
        password_hash,
        Utc::now(),
    ) {
        Ok(user) => user,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_user(user.clone()).await {
        return errors::store_error_to_response(e);
    }

    let token = match codec.issue(user.id, user.role, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("token issuance failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "failed to issue token",
            );
        }
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "token": token,
            "user": dto::user_to_json(&user),
        })),
    )
        .into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let user = match services.user_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password",
            );
        }
        Err(e) => {
            tracing::error!("password verification failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "failed to verify password",
            );
        }
    }

    let token = match codec.issue(user.id, user.role, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("token issuance failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "failed to issue token",
            );
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "token": token,
            "user": dto::user_to_json(&user),
        })),
    )
        .into_response()
}
