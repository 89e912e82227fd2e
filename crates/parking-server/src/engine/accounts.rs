//! Principal accounts: signup, login, provisioning and removal

use parking_auth::{
    check_password_policy, hash_password, normalize_email, IssuedToken, Session, SessionAuthenticator,
};
use parking_core::{Clock, ParkingError, Principal, Role};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use crate::storage::{ParkingStore, PrincipalRecord, StorageError};

const MAX_DISPLAY_NAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

/// Signup or provisioning request
#[derive(Clone, Deserialize)]
pub struct NewAccount {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn validate_display_name(raw: &str) -> Result<String, ParkingError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ParkingError::invalid("display_name", "must not be empty"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ParkingError::invalid(
            "display_name",
            format!("at most {} characters", MAX_DISPLAY_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

fn validate_email(raw: &str) -> Result<String, ParkingError> {
    let email = normalize_email(raw);
    let shaped = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !shaped || email.len() > MAX_EMAIL_LEN || email.contains(char::is_whitespace) {
        return Err(ParkingError::invalid("email", "not an email address"));
    }
    Ok(email)
}

/// Account management over the per-role principal tables
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn ParkingStore>,
    authenticator: SessionAuthenticator,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        authenticator: SessionAuthenticator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            authenticator,
            clock,
        }
    }

    async fn create(&self, role: Role, account: NewAccount) -> EngineResult<Principal> {
        let display_name = validate_display_name(&account.display_name)?;
        let email = validate_email(&account.email)?;
        check_password_policy(&account.password)?;

        let principal = Principal {
            id: Uuid::new_v4(),
            display_name,
            email,
            role,
        };
        let record = PrincipalRecord {
            principal: principal.clone(),
            password_hash: hash_password(&account.password)?,
            active: true,
            created_at: self.clock.now(),
        };

        self.store.create_principal(record).await.map_err(|e| match e {
            StorageError::Conflict(_) => EngineError::DuplicateAccount,
            other => EngineError::Storage(other),
        })?;

        info!(role = %role, id = %principal.id, "Account created");
        Ok(principal)
    }

    /// Driver self-signup
    pub async fn signup_driver(&self, account: NewAccount) -> EngineResult<Principal> {
        self.create(Role::Driver, account).await
    }

    /// Password login against the table for `role`
    pub async fn login(&self, role: Role, email: &str, password: &str) -> EngineResult<IssuedToken> {
        Ok(self.authenticator.login(role, email, password).await?)
    }

    /// Admin creates an enforcer or another admin
    pub async fn provision(&self, admin: &Session, role: Role, account: NewAccount) -> EngineResult<Principal> {
        admin.require(Role::Admin)?;
        if role == Role::Driver {
            return Err(ParkingError::invalid("role", "drivers sign up themselves").into());
        }
        let principal = self.create(role, account).await?;
        info!(admin = %admin.subject_id, role = %role, id = %principal.id, "Principal provisioned");
        Ok(principal)
    }

    pub async fn list_enforcers(&self, admin: &Session) -> EngineResult<Vec<Principal>> {
        admin.require(Role::Admin)?;
        Ok(self.store.list_principals(Role::Enforcer).await?)
    }

    /// Hard-delete an enforcer; their outstanding tokens stop working at once
    pub async fn delete_enforcer(&self, admin: &Session, enforcer_id: Uuid) -> EngineResult<()> {
        admin.require(Role::Admin)?;
        if !self.store.delete_principal(Role::Enforcer, enforcer_id).await? {
            return Err(EngineError::PrincipalNotFound("enforcer"));
        }
        info!(admin = %admin.subject_id, enforcer = %enforcer_id, "Enforcer deleted");
        Ok(())
    }

    /// Soft-deactivate any principal
    pub async fn deactivate(&self, admin: &Session, role: Role, id: Uuid) -> EngineResult<()> {
        admin.require(Role::Admin)?;
        if !self.store.deactivate_principal(role, id).await? {
            return Err(EngineError::PrincipalNotFound(role.as_str()));
        }
        info!(admin = %admin.subject_id, role = %role, id = %id, "Principal deactivated");
        Ok(())
    }

    /// The caller's own profile
    pub async fn me(&self, session: &Session) -> EngineResult<Principal> {
        let record = self
            .store
            .get_principal(session.role, session.subject_id)
            .await?
            .filter(|r| r.active)
            .ok_or(EngineError::PrincipalNotFound(session.role.as_str()))?;
        Ok(record.principal)
    }

    /// Create the first administrator if no admin has that email yet
    pub async fn ensure_admin(&self, email: &str, password: &str) -> EngineResult<bool> {
        let normalized = normalize_email(email);
        if self
            .store
            .find_principal_by_email(Role::Admin, &normalized)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let account = NewAccount {
            display_name: "Administrator".into(),
            email: normalized,
            password: password.to_string(),
        };
        let principal = self.create(Role::Admin, account).await?;
        info!(id = %principal.id, "Bootstrap administrator created");
        Ok(true)
    }
}
