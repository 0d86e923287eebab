//! Session JWT handling
//!
//! CareBridge sessions are short-lived HS256 JWTs carrying the principal's
//! id, email and role. The role claim is advisory for UI rendering only;
//! services re-read it from the user row before any privileged action.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;

/// Claims carried by a CareBridge session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject: user id (UUID string)
    pub sub: String,
    /// Email the principal authenticated with
    pub email: String,
    /// Global role at issue time
    pub role: Role,
    /// Token type discriminator; always "session" for API access
    pub token_type: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiration time (unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    pub fn new(user_id: String, email: String, role: Role, validity: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email,
            role,
            token_type: "session".to_string(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            iss: "carebridge".to_string(),
        }
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    Encoding(jsonwebtoken::errors::Error),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Validates session JWTs against a shared HMAC-SHA256 secret.
///
/// Only the signature and expiration are enforced; issuer and audience
/// checks are intentionally skipped so tokens survive deployment renames.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.validate_nbf = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Encode claims into a signed token.
    pub fn encode(secret: &[u8], claims: &SessionClaims) -> Result<String, JwtError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(JwtError::Encoding)
    }

    /// Decode and validate a token, returning its claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-session-secret";

    fn claims(validity: Duration) -> SessionClaims {
        SessionClaims::new(
            "5f2b9a1e-7c63-4a1f-9a2e-0d8f3b6c4e21".to_string(),
            "owner@example.com".to_string(),
            Role::Admin,
            validity,
        )
    }

    #[test]
    fn test_encode_validate_round_trip() {
        let claims = claims(Duration::hours(1));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let validator = JwtValidator::new(SECRET);
        let decoded = validator.validate(&token).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.role, Role::Admin);
        assert_eq!(decoded.token_type, "session");
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = claims(Duration::seconds(-30));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let validator = JwtValidator::new(SECRET);
        assert!(matches!(validator.validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = claims(Duration::hours(1));
        let token = JwtValidator::encode(b"other-secret", &claims).unwrap();

        let validator = JwtValidator::new(SECRET);
        assert!(matches!(validator.validate(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let validator = JwtValidator::new(SECRET);
        assert!(matches!(
            validator.validate("not.a.jwt"),
            Err(JwtError::Invalid)
        ));
    }
}
