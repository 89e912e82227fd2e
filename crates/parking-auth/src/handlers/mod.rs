//! Credential handlers: session tokens, passwords and gateway keys

pub mod apikey;
pub mod jwt;
pub mod password;

pub use apikey::{ApiKeyBackend, ApiKeyGuard, ApiKeyInfo, InMemoryApiKeyBackend};
pub use jwt::{SessionClaims, TokenSigner, MAX_TOKEN_TTL_MINUTES, MIN_TOKEN_TTL_MINUTES};
pub use password::{check_password_policy, hash_password, verify_password};
