//! Server configuration read from `PARKING_*` environment variables

use chrono::{DateTime, Utc};
use parking_auth::handlers::jwt::{MAX_TOKEN_TTL_MINUTES, MIN_SECRET_LEN, MIN_TOKEN_TTL_MINUTES};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Startup configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials for the bootstrap administrator
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Complete server configuration
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: Level,
    pub token_secret: String,
    pub token_ttl_minutes: i64,
    pub database_url: Option<String>,
    pub police_api_key: Option<String>,
    pub registrar_api_key: Option<String>,
    /// Shared expiry for both gateway keys
    pub gateway_keys_expire_at: Option<DateTime<Utc>>,
    pub service_key: Option<String>,
    pub registry_url: Option<String>,
    pub notify_webhook_url: Option<String>,
    pub upstream_timeout: Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("database", &self.database_url.is_some())
            .field("police_gateway", &self.police_api_key.is_some())
            .field("registrar_gateway", &self.registrar_api_key.is_some())
            .field("gateway_keys_expire_at", &self.gateway_keys_expire_at)
            .field("internal_routes", &self.service_key.is_some())
            .field("registry_url", &self.registry_url)
            .field("notify_webhook_url", &self.notify_webhook_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Read configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PARKING_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PARKING_PORT",
                reason: e.to_string(),
            })?,
            None => Self::DEFAULT_PORT,
        };

        let log_level = match get("PARKING_LOG_LEVEL") {
            Some(raw) => raw.parse::<Level>().map_err(|e| ConfigError::Invalid {
                name: "PARKING_LOG_LEVEL",
                reason: e.to_string(),
            })?,
            None => Level::INFO,
        };

        let token_secret = get("PARKING_TOKEN_SECRET").ok_or(ConfigError::Missing("PARKING_TOKEN_SECRET"))?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "PARKING_TOKEN_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let token_ttl_minutes = match get("PARKING_TOKEN_TTL_MINUTES") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                name: "PARKING_TOKEN_TTL_MINUTES",
                reason: e.to_string(),
            })?,
            None => MIN_TOKEN_TTL_MINUTES,
        };
        if !(MIN_TOKEN_TTL_MINUTES..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(ConfigError::Invalid {
                name: "PARKING_TOKEN_TTL_MINUTES",
                reason: format!(
                    "must be between {} and {}",
                    MIN_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES
                ),
            });
        }

        let upstream_timeout = match get("PARKING_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: "PARKING_UPSTREAM_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "PARKING_UPSTREAM_TIMEOUT_SECS",
                        reason: "must be positive".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(Self::DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let gateway_keys_expire_at = match get("PARKING_GATEWAY_KEYS_EXPIRE_AT") {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| ConfigError::Invalid {
                        name: "PARKING_GATEWAY_KEYS_EXPIRE_AT",
                        reason: e.to_string(),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let bootstrap_admin = match (
            get("PARKING_BOOTSTRAP_ADMIN_EMAIL"),
            get("PARKING_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("PARKING_BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("PARKING_BOOTSTRAP_ADMIN_EMAIL")),
        };

        Ok(Self {
            port,
            log_level,
            token_secret,
            token_ttl_minutes,
            database_url: get("PARKING_DATABASE_URL"),
            police_api_key: get("PARKING_POLICE_API_KEY"),
            registrar_api_key: get("PARKING_REGISTRAR_API_KEY"),
            gateway_keys_expire_at,
            service_key: get("PARKING_SERVICE_KEY"),
            registry_url: get("PARKING_REGISTRY_URL"),
            notify_webhook_url: get("PARKING_NOTIFY_WEBHOOK_URL"),
            upstream_timeout,
            bootstrap_admin,
        })
    }
}
