//! Gateway API Key Handler
//!
//! Third-party consumers (police, registrar) do not hold sessions. Each one is
//! given an API key scoped to exactly one external role.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_core::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::types::GatewayScope;

/// Information about a registered API key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    /// Unique identifier for the key (safe to log)
    pub key_id: String,

    /// Agency holding the key
    pub owner: String,

    /// The single external role this key may act as
    pub scope: GatewayScope,

    /// When the key expires (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKeyInfo {
    pub fn new(key_id: impl Into<String>, owner: impl Into<String>, scope: GatewayScope) -> Self {
        Self {
            key_id: key_id.into(),
            owner: owner.into(),
            scope,
            expires_at: None,
        }
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Backend trait for API key validation
///
/// Implement this trait to integrate with different key storage systems.
#[async_trait]
pub trait ApiKeyBackend: Send + Sync {
    /// Validate an API key and return its info
    async fn validate(&self, api_key: &str) -> Result<ApiKeyInfo>;

    /// Get a description of this backend
    fn description(&self) -> &str {
        "API key backend"
    }
}

/// In-memory API key backend, populated from configuration at startup
pub struct InMemoryApiKeyBackend {
    keys: RwLock<HashMap<String, ApiKeyInfo>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryApiKeyBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Register an API key
    pub fn register_key(&self, api_key: impl Into<String>, info: ApiKeyInfo) {
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        keys.insert(api_key.into(), info);
    }

    /// List key ids (never the keys themselves)
    pub fn list_key_ids(&self) -> Vec<String> {
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());
        keys.values().map(|info| info.key_id.clone()).collect()
    }
}

#[async_trait]
impl ApiKeyBackend for InMemoryApiKeyBackend {
    async fn validate(&self, api_key: &str) -> Result<ApiKeyInfo> {
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());

        let info = keys.get(api_key).ok_or(AuthError::ApiKeyNotFound)?;

        if let Some(exp) = info.expires_at {
            if exp < self.clock.now() {
                return Err(AuthError::ApiKeyExpired(exp.to_rfc3339()));
            }
        }

        Ok(info.clone())
    }

    fn description(&self) -> &str {
        "in-memory API key backend"
    }
}

/// Checks a presented key against a backend and a required scope
#[derive(Clone)]
pub struct ApiKeyGuard {
    backend: Arc<dyn ApiKeyBackend>,
}

impl ApiKeyGuard {
    pub fn new(backend: Arc<dyn ApiKeyBackend>) -> Self {
        Self { backend }
    }

    pub async fn authorize(&self, presented: Option<&str>, scope: GatewayScope) -> Result<ApiKeyInfo> {
        let api_key = presented
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AuthError::MissingApiKey)?;

        let info = self.backend.validate(api_key).await.map_err(|e| {
            warn!(scope = %scope, error = %e, "Gateway key rejected");
            e
        })?;

        if info.scope != scope {
            warn!(key_id = %info.key_id, held = %info.scope, required = %scope, "Gateway key used outside its scope");
            return Err(AuthError::ScopeDenied { scope });
        }

        debug!(key_id = %info.key_id, owner = %info.owner, scope = %scope, "Gateway key accepted");
        Ok(info)
    }
}
