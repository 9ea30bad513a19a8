use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use storefront_core::UserId;

use crate::claims::{JwtClaims, validate_claims};
use crate::role::Role;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encode(String),

    #[error("failed to decode token: {0}")]
    Decode(String),

    #[error(transparent)]
    Claims(#[from] crate::claims::TokenValidationError),
}

/// HS256 token issue/verify pair built from a shared secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::hours(12),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a token for an authenticated user.
    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature and claims, returning the decoded claims.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Decode(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_decode_round_trips() {
        let codec = TokenCodec::new(b"test-secret");
        let user_id = UserId::new();
        let now = Utc::now();

        let token = codec.issue(user_id, Role::Admin, now).unwrap();
        let claims = codec.decode(&token, now).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn decode_rejects_wrong_secret() {
        let codec = TokenCodec::new(b"test-secret");
        let other = TokenCodec::new(b"other-secret");
        let now = Utc::now();

        let token = codec.issue(UserId::new(), Role::Customer, now).unwrap();
        assert!(matches!(
            other.decode(&token, now),
            Err(TokenError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_expired_token() {
        let codec = TokenCodec::new(b"test-secret").with_ttl(Duration::hours(1));
        let issued = Utc::now() - Duration::hours(3);

        let token = codec.issue(UserId::new(), Role::Customer, issued).unwrap();
        assert!(codec.decode(&token, Utc::now()).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        let codec = TokenCodec::new(b"test-secret");
        assert!(matches!(
            codec.decode("not-a-token", Utc::now()),
            Err(TokenError::Decode(_))
        ));
    }
}
