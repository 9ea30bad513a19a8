use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// `iat`/`exp` are Unix timestamps so standard JWT validation applies to them
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Role granted to the subject.
    pub role: Role,

    /// Issued-at (Unix seconds).
    pub iat: i64,

    /// Expiration (Unix seconds).
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// lives in [`crate::TokenCodec`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(now: DateTime<Utc>, issued_offset: i64, expires_offset: i64) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            role: Role::Customer,
            iat: (now + Duration::seconds(issued_offset)).timestamp(),
            exp: (now + Duration::seconds(expires_offset)).timestamp(),
        }
    }

    #[test]
    fn accepts_claims_inside_the_window() {
        let now = Utc::now();
        assert!(validate_claims(&claims_at(now, -60, 600), now).is_ok());
    }

    #[test]
    fn rejects_expired_claims() {
        let now = Utc::now();
        let err = validate_claims(&claims_at(now, -600, -60), now).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn rejects_claims_issued_in_the_future() {
        let now = Utc::now();
        let err = validate_claims(&claims_at(now, 60, 600), now).unwrap_err();
        assert_eq!(err, TokenValidationError::NotYetValid);
    }

    #[test]
    fn rejects_inverted_time_window() {
        let now = Utc::now();
        let err = validate_claims(&claims_at(now, 600, 60), now).unwrap_err();
        assert_eq!(err, TokenValidationError::InvalidTimeWindow);
    }
}
