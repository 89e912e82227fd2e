//! Credential Store view over the parking store
//!
//! Exposes the principal tables to the session authenticator. Deactivated
//! principals are invisible here, so their tokens stop working immediately.

use async_trait::async_trait;
use parking_auth::{AuthError, CredentialStore, StoredCredential};
use parking_core::{Principal, Role};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{ParkingStore, StorageError};

/// [`CredentialStore`] backed by a [`ParkingStore`]
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    store: Arc<dyn ParkingStore>,
}

impl StoreCredentials {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }
}

fn store_error(e: StorageError) -> AuthError {
    error!(error = %e, "Credential lookup failed");
    AuthError::Store(e.to_string())
}

#[async_trait]
impl CredentialStore for StoreCredentials {
    async fn find_subject(&self, role: Role, subject_id: Uuid) -> parking_auth::Result<Option<Principal>> {
        let record = self
            .store
            .get_principal(role, subject_id)
            .await
            .map_err(store_error)?;
        Ok(record.filter(|r| r.active).map(|r| r.principal))
    }

    async fn find_login(&self, role: Role, email: &str) -> parking_auth::Result<Option<StoredCredential>> {
        let record = self
            .store
            .find_principal_by_email(role, email)
            .await
            .map_err(store_error)?;
        Ok(record.filter(|r| r.active).map(|r| StoredCredential {
            principal: r.principal,
            password_hash: r.password_hash,
        }))
    }
}
