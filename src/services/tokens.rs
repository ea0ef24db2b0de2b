//! Session and password-reset tokens.
//!
//! Session tokens are HS256 JWTs carrying the user id; reset tokens are
//! random one-time values stored only as a sha256 digest.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// Claims carried by a session JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i32,
    /// Issued-at, unix seconds; compared against `password_changed_at`
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// A freshly generated reset token. Only `plain` ever leaves the server,
/// inside the reset email; the database sees `hashed`.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plain: String,
    pub hashed: String,
    pub expires_at: String,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            session_ttl: Duration::days(config.session_ttl_days),
            reset_ttl: Duration::minutes(config.reset_ttl_minutes),
        }
    }

    pub fn issue_session(&self, user_id: i32) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        Ok(data.claims)
    }

    /// Generate a reset token: 32 random bytes, hex on the wire, sha256
    /// hex at rest.
    #[must_use]
    pub fn issue_reset(&self) -> ResetToken {
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        let plain = hex::encode(bytes);
        let hashed = hash_reset(&plain);
        let expires_at = (Utc::now() + self.reset_ttl).to_rfc3339();

        ResetToken {
            plain,
            hashed,
            expires_at,
        }
    }
}

/// Deterministic digest used to look up a pending reset.
#[must_use]
pub fn hash_reset(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            ..AuthConfig::default()
        };
        TokenService::new(&config)
    }

    #[test]
    fn session_roundtrip() {
        let service = test_service();
        let token = service.issue_session(42).expect("issue");
        let claims = service.verify_session(&token).expect("verify");

        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_rejected() {
        let service = test_service();
        let token = service.issue_session(42).expect("issue");
        let mut tampered = token.clone();
        tampered.push('x');

        assert!(matches!(
            service.verify_session(&tampered),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.verify_session("not-a-jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let service = test_service();
        let other = TokenService::new(&AuthConfig {
            jwt_secret: "ffffffffffffffffffffffffffffffff".to_string(),
            ..AuthConfig::default()
        });

        let token = service.issue_session(1).expect("issue");
        assert!(other.verify_session(&token).is_err());
    }

    #[test]
    fn reset_tokens_are_unique_and_hashable() {
        let service = test_service();
        let a = service.issue_reset();
        let b = service.issue_reset();

        assert_ne!(a.plain, b.plain);
        assert_eq!(a.plain.len(), 64);
        assert_eq!(hash_reset(&a.plain), a.hashed);
        assert_ne!(a.plain, a.hashed);
    }

    #[test]
    fn reset_expiry_is_in_the_future() {
        let service = test_service();
        let token = service.issue_reset();
        let expires = chrono::DateTime::parse_from_rfc3339(&token.expires_at).expect("rfc3339");
        assert!(expires.timestamp() > Utc::now().timestamp());
    }
}
