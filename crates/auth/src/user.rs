use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// A user account.
///
/// `username` and `email` are unique across the store (enforced by the
/// persistence layer). `password_hash` is an Argon2id PHC string and must
/// never be serialized into API responses; response mapping lives in the API
/// layer and only ever copies the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        password_hash: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }

        let email = email.into();
        if email.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            id,
            username: username.trim().to_string(),
            email: email.trim().to_lowercase(),
            role,
            password_hash: password_hash.into(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new(
            UserId::new(),
            "alice",
            "  Alice@Example.COM ",
            Role::Customer,
            "$argon2id$stub",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn new_user_rejects_invalid_email() {
        let err = User::new(
            UserId::new(),
            "alice",
            "not-an-email",
            Role::Customer,
            "$argon2id$stub",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_user_rejects_blank_username() {
        let err = User::new(
            UserId::new(),
            "   ",
            "a@b.example",
            Role::Customer,
            "$argon2id$stub",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
