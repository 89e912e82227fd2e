//! Session authenticator - turns bearer tokens into role-bound sessions

use async_trait::async_trait;
use parking_core::{Principal, Role};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::handlers::jwt::TokenSigner;
use crate::handlers::password::{verify_against_dummy, verify_password};
use crate::types::{IssuedToken, Session, StoredCredential};

/// Read access to the principal tables
///
/// One table per role. A subject that exists in the driver table is not an
/// enforcer, even if the ids happen to collide.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an active subject in the table for `role`
    async fn find_subject(&self, role: Role, subject_id: Uuid) -> Result<Option<Principal>>;

    /// Look up an active account by login email in the table for `role`
    async fn find_login(&self, role: Role, email: &str) -> Result<Option<StoredCredential>>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Normalized form of a login email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Verifies session tokens and binds them to a role
#[derive(Clone)]
pub struct SessionAuthenticator {
    signer: Arc<TokenSigner>,
    store: Arc<dyn CredentialStore>,
}

impl SessionAuthenticator {
    pub fn new(signer: Arc<TokenSigner>, store: Arc<dyn CredentialStore>) -> Self {
        Self { signer, store }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Authenticate a bearer token for an operation that requires `required`
    ///
    /// The token proves who the caller is; the role comes from whether that
    /// subject currently exists in the `required` table.
    pub async fn authenticate(&self, bearer: Option<&str>, required: Role) -> Result<Session> {
        let token = bearer.ok_or(AuthError::MissingToken)?;

        let subject_id = self.signer.verify(token).map_err(|e| {
            debug!(role = %required, error = %e, "Session token rejected");
            e
        })?;

        let principal = self
            .store
            .find_subject(required, subject_id)
            .await?
            .ok_or_else(|| {
                warn!(subject = %subject_id, role = %required, "Subject not present in role table");
                AuthError::Unauthorized { role: required }
            })?;

        Ok(Session::from(principal))
    }

    /// Check a password login against the table for `role` and issue a token
    pub async fn login(&self, role: Role, email: &str, password: &str) -> Result<IssuedToken> {
        let email = normalize_email(email);

        let credential = match self.store.find_login(role, &email).await? {
            Some(credential) => credential,
            None => {
                verify_against_dummy(password);
                info!(role = %role, "Login for unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &credential.password_hash)? {
            info!(role = %role, subject = %credential.principal.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.signer.issue(credential.principal.id)?;
        info!(role = %role, subject = %credential.principal.id, "Session issued");
        Ok(issued)
    }
}
