//! API-side capability guard.
//!
//! Capabilities are checked here, at the request boundary, before any service
//! call; the domain and store layers stay auth-agnostic.

use axum::http::StatusCode;

use storefront_auth::{Capability, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Require one capability for the current request.
///
/// Returns the ready-to-send 403 response on denial so handlers can
/// early-return with `?`-like brevity.
pub fn require(
    principal: &PrincipalContext,
    capability: Capability,
) -> Result<(), axum::response::Response> {
    authorize(&principal.principal(), capability)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
