//! Error types for session authentication and gateway keys

use parking_core::Role;
use thiserror::Error;

use crate::types::GatewayScope;

/// Result type for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authenticating a caller
#[derive(Error, Debug)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("Missing bearer token")]
    MissingToken,

    /// Token is malformed or its signature does not verify
    #[error("Invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token verified but its lifetime has passed
    #[error("Session token expired")]
    Expired,

    /// Token verified but the subject is not (or no longer) in the required role table
    #[error("Subject is not an active {role}")]
    Unauthorized { role: Role },

    /// Login with an unknown account or a wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Password does not meet the minimum policy
    #[error("Password rejected: {0}")]
    WeakPassword(String),

    /// Hashing or parsing a stored password hash failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// No API key was presented to the gateway
    #[error("Missing API key")]
    MissingApiKey,

    /// API key not found
    #[error("API key not found")]
    ApiKeyNotFound,

    /// API key past its expiry
    #[error("API key expired at {0}")]
    ApiKeyExpired(String),

    /// API key is valid but scoped to another external role
    #[error("API key is not scoped for {scope}")]
    ScopeDenied { scope: GatewayScope },

    /// Signing configuration is unusable
    #[error("Invalid authentication configuration: {0}")]
    Configuration(String),

    /// The credential store could not be reached
    #[error("Credential store error: {0}")]
    Store(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidSignature(err.to_string()),
        }
    }
}
