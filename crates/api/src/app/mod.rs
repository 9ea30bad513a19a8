//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (store backend + service facade)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use storefront_auth::TokenCodec;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let codec = Arc::new(TokenCodec::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        codec: codec.clone(),
    };

    let services = Arc::new(services::build_services().await);

    // Public routes: health + signup/login.
    let public = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router());

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(Extension(services))
        .layer(Extension(codec))
        .layer(ServiceBuilder::new())
}
