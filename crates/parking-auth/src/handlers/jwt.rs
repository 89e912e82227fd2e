//! Session Token Signing
//!
//! Session tokens are HS256 JWTs signed with one secret shared by every
//! service. They carry the subject id and lifetime only: the role is never
//! read from the token, it is re-derived from the credential store on use.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_core::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::types::IssuedToken;

/// Shortest allowed session lifetime in minutes
pub const MIN_TOKEN_TTL_MINUTES: i64 = 30;

/// Longest allowed session lifetime in minutes
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60;

/// Minimum secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject id
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Issues and verifies session tokens
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_minutes", &self.ttl.num_minutes())
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer from the shared secret
    ///
    /// Rejects secrets shorter than [`MIN_SECRET_LEN`] and lifetimes outside
    /// `MIN_TOKEN_TTL_MINUTES..=MAX_TOKEN_TTL_MINUTES`.
    pub fn new(secret: &[u8], ttl_minutes: i64, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "token secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if !(MIN_TOKEN_TTL_MINUTES..=MAX_TOKEN_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(AuthError::Configuration(format!(
                "token lifetime must be between {} and {} minutes",
                MIN_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::minutes(ttl_minutes),
            clock,
        })
    }

    /// Sign a token for `subject_id`, expiring one lifetime from now
    pub fn issue(&self, subject_id: Uuid) -> Result<IssuedToken> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.ttl;

        let claims = SessionClaims {
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Configuration(format!("failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and lifetime, returning the subject id
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        let claims = data.claims;

        if claims.exp < self.clock.now().timestamp() {
            debug!(sub = %claims.sub, "Rejected expired session token");
            return Err(AuthError::Expired);
        }

        Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::InvalidSignature(format!("malformed subject: {}", e)))
    }
}
