//! Token issuance/verification and password hashing.
//!
//! Tokens are HMAC-signed JWTs carrying the user id and a token type; only
//! `ACCESS` tokens pass the bearer guard. Passwords are argon2 hashes
//! written at registration and checked at login through the `with_password`
//! scope.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::constants::TokenType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user_id: i64, token_type: TokenType, config: &AppConfig) -> Result<String> {
    let hours = match token_type {
        TokenType::Access => config.access_token_hours,
        TokenType::Verify => config.verify_token_hours,
    };
    let now = Utc::now();
    let claims = Claims {
        user_id,
        token_type,
        iat: now.timestamp(),
        exp: (now + Duration::hours(hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secure_key.as_bytes()),
    )
    .map_err(|e| Error::Auth(format!("token issuance failed: {e}")))
}

pub fn verify_token(token: &str, secure_key: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secure_key.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Auth("Invalid or expired token".to_string()))
}

pub fn hash_password(raw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Auth(format!("password hashing failed: {e}")))
}

pub fn verify_password(raw: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips() {
        let config = AppConfig::default();
        let token = issue_token(42, TokenType::Access, &config).unwrap();
        let claims = verify_token(&token, &config.secure_key).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = AppConfig::default();
        let token = issue_token(42, TokenType::Access, &config).unwrap();
        assert!(verify_token(&token, "a-different-key").is_err());
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("Secur3!pass").unwrap();
        assert!(verify_password("Secur3!pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("Secur3!pass", "not-a-hash"));
    }
}
