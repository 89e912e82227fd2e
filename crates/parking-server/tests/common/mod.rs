//! Shared fixtures for the server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_auth::{ApiKeyInfo, GatewayScope, InMemoryApiKeyBackend, Session, TokenSigner};
use parking_core::{Contact, FixedClock, NewPermitType, NewVehicle, PermitType, Role, Vehicle, VehicleKey};
use parking_server::engine::NewAccount;
use parking_server::notify::NotifyError;
use parking_server::{
    AppState, AppStateBuilder, MemoryStore, Notification, Notifier, UpstreamError, VehicleOwnerLookup,
    VehicleOwnershipConfirmer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-secret-0123456789-abcdefgh";
pub const PASSWORD: &str = "correct horse battery";
pub const ADMIN_EMAIL: &str = "root@campus.example";
pub const POLICE_KEY: &str = "police-key-0001";
pub const REGISTRAR_KEY: &str = "registrar-key-0001";

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().expect("valid timestamp")
}

pub fn email(name: &str) -> String {
    format!("{}@campus.example", name.to_ascii_lowercase())
}

// =============================================================================
// Fakes
// =============================================================================

/// Forwards every notification into a channel
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl RecordingNotifier {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map_err(|e| NotifyError(e.to_string()))
    }
}

/// Rejects every delivery
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError("mail relay down".into()))
    }
}

/// A vehicle registry that never answers
pub struct UnreachableRegistry;

#[async_trait]
impl VehicleOwnershipConfirmer for UnreachableRegistry {
    async fn confirm_ownership(&self, _key: &VehicleKey, _driver_id: Uuid) -> Result<Option<Vehicle>, UpstreamError> {
        Err(UpstreamError("connection refused".into()))
    }
}

#[async_trait]
impl VehicleOwnerLookup for UnreachableRegistry {
    async fn owner_contact(&self, _vehicle_id: Uuid) -> Result<Option<Contact>, UpstreamError> {
        Err(UpstreamError("connection refused".into()))
    }
}

/// Wait briefly for the next detached notification
pub async fn next_notification(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("notification within timeout")
        .expect("notifier channel open")
}

// =============================================================================
// Harness
// =============================================================================

/// A fully wired service over an in-memory store and a settable clock
pub struct Harness {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub clock: FixedClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    /// Build with the default gateway keys, then let the caller adjust
    pub fn with(configure: impl FnOnce(AppStateBuilder) -> AppStateBuilder) -> Self {
        let clock = FixedClock::new(at("2026-05-22T00:00:00Z"));
        let store = Arc::new(MemoryStore::new());
        let signer = TokenSigner::new(SECRET, 30, Arc::new(clock.clone())).expect("signer");

        let keys = Arc::new(InMemoryApiKeyBackend::new(Arc::new(clock.clone())));
        keys.register_key(POLICE_KEY, ApiKeyInfo::new("police", "campus-police", GatewayScope::Police));
        keys.register_key(
            REGISTRAR_KEY,
            ApiKeyInfo::new("registrar", "registrar-office", GatewayScope::Registrar),
        );

        let builder = AppState::builder(store.clone(), signer, Arc::new(clock.clone())).with_api_keys(keys);
        let state = Arc::new(configure(builder).build());

        Self { state, store, clock }
    }

    pub async fn token(&self, role: Role, email: &str) -> String {
        self.state
            .accounts
            .login(role, email, PASSWORD)
            .await
            .expect("login")
            .token
    }

    pub async fn session(&self, role: Role, email: &str) -> Session {
        let token = self.token(role, email).await;
        self.state
            .authenticator
            .authenticate(Some(&token), role)
            .await
            .expect("authenticate")
    }

    pub async fn driver(&self, name: &str) -> Session {
        self.state
            .accounts
            .signup_driver(NewAccount {
                display_name: name.into(),
                email: email(name),
                password: PASSWORD.into(),
            })
            .await
            .expect("signup");
        self.session(Role::Driver, &email(name)).await
    }

    pub async fn admin(&self) -> Session {
        self.state
            .accounts
            .ensure_admin(ADMIN_EMAIL, PASSWORD)
            .await
            .expect("bootstrap admin");
        self.session(Role::Admin, ADMIN_EMAIL).await
    }

    pub async fn enforcer(&self, name: &str) -> Session {
        let admin = self.admin().await;
        self.state
            .accounts
            .provision(
                &admin,
                Role::Enforcer,
                NewAccount {
                    display_name: name.into(),
                    email: email(name),
                    password: PASSWORD.into(),
                },
            )
            .await
            .expect("provision enforcer");
        self.session(Role::Enforcer, &email(name)).await
    }

    pub async fn vehicle(&self, driver: &Session, plate: &str) -> Vehicle {
        self.state
            .registry
            .register(
                driver,
                NewVehicle {
                    plate: plate.into(),
                    state: "WA".into(),
                    make: "Honda".into(),
                    model: "Civic".into(),
                    year: 2018,
                    color: "blue".into(),
                },
            )
            .await
            .expect("register vehicle")
    }

    pub async fn permit_type(&self, duration_class: &str) -> PermitType {
        let admin = self.admin().await;
        self.state
            .catalog
            .create(
                &admin,
                NewPermitType {
                    class_name: format!("{} pass", duration_class),
                    duration_class: duration_class.into(),
                    price_cents: 800,
                },
            )
            .await
            .expect("create permit type")
    }

    pub async fn day_pass(&self) -> PermitType {
        self.permit_type("day").await
    }
}
