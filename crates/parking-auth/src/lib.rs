//! Parking Auth
//!
//! Authentication for the parking services: who is calling, and in which role.
//!
//! ## Sessions
//!
//! Drivers, enforcers and admins log in with email and password against the
//! table for their role and receive a short-lived HS256 token. The token holds
//! only the subject id. Every protected call names the role it needs, and the
//! [`SessionAuthenticator`] checks that the subject is currently present in that
//! role's table. Removing an enforcer therefore revokes their access at once,
//! even while their token is still inside its lifetime.
//!
//! ## Gateway keys
//!
//! Police and the registrar use per-agency API keys. Each key is scoped to one
//! [`GatewayScope`] and checked by an [`ApiKeyGuard`].
//!
//! ## Usage
//!
//! ```ignore
//! use parking_auth::{SessionAuthenticator, TokenSigner};
//!
//! let signer = TokenSigner::new(secret.as_bytes(), 30, clock)?;
//! let auth = SessionAuthenticator::new(Arc::new(signer), credential_store);
//!
//! let token = auth.login(Role::Driver, "dana@campus.example", "hunter2hunter2").await?;
//! let session = auth.authenticate(Some(&token.token), Role::Driver).await?;
//! ```

pub mod authenticator;
pub mod error;
pub mod handlers;
pub mod types;

pub use authenticator::{bearer_token, normalize_email, CredentialStore, SessionAuthenticator};
pub use error::{AuthError, Result};
pub use handlers::{
    check_password_policy, hash_password, verify_password, ApiKeyBackend, ApiKeyGuard, ApiKeyInfo,
    InMemoryApiKeyBackend, TokenSigner,
};
pub use types::{GatewayScope, IssuedToken, Session, StoredCredential};
