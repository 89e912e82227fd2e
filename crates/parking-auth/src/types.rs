//! Core types for session authentication

use chrono::{DateTime, Utc};
use parking_core::{Contact, Principal, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, Result};

/// An authenticated caller
///
/// Produced by [`crate::SessionAuthenticator::authenticate`] after the subject
/// has been re-resolved against the table of the required role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub subject_id: Uuid,
    pub role: Role,
    pub display_name: String,
    pub email: String,
}

impl Session {
    /// Fail unless this session was resolved for `role`
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuthError::Unauthorized { role })
        }
    }

    pub fn contact(&self) -> Contact {
        Contact {
            principal_id: self.subject_id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl From<Principal> for Session {
    fn from(principal: Principal) -> Self {
        Self {
            subject_id: principal.id,
            role: principal.role,
            display_name: principal.display_name,
            email: principal.email,
        }
    }
}

/// A freshly signed session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// A principal row together with its salted password hash
///
/// Only the credential store and the login path ever see this.
#[derive(Clone)]
pub struct StoredCredential {
    pub principal: Principal,
    pub password_hash: String,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("principal", &self.principal)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}

/// External consumers of the key-authenticated gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayScope {
    /// May ask whether a plate has a valid permit
    Police,
    /// May ask whether an account has unpaid tickets
    Registrar,
}

impl std::fmt::Display for GatewayScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayScope::Police => write!(f, "police"),
            GatewayScope::Registrar => write!(f, "registrar"),
        }
    }
}
