//! Application state shared across handlers

use parking_auth::{
    ApiKeyBackend, ApiKeyGuard, InMemoryApiKeyBackend, SessionAuthenticator, TokenSigner,
};
use parking_core::Clock;
use std::sync::Arc;

use crate::clients::{LocalRegistryClient, VehicleOwnerLookup, VehicleOwnershipConfirmer};
use crate::engine::{
    AccountService, CatalogService, PermitEngine, TicketEngine, ValidityChecker, VehicleRegistry,
};
use crate::notify::{LogNotifier, Notifier};
use crate::storage::{ParkingStore, StoreCredentials};

/// Everything a request handler can reach
///
/// Built once at startup and shared behind an `Arc`.
pub struct AppState {
    pub store: Arc<dyn ParkingStore>,
    pub authenticator: SessionAuthenticator,
    pub gateway: ApiKeyGuard,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub registry: VehicleRegistry,
    pub permits: PermitEngine,
    pub validity: ValidityChecker,
    pub tickets: TicketEngine,
    /// Shared key for the internal registry routes; `None` leaves them unmounted
    pub service_key: Option<String>,
}

impl AppState {
    pub fn builder(store: Arc<dyn ParkingStore>, signer: TokenSigner, clock: Arc<dyn Clock>) -> AppStateBuilder {
        AppStateBuilder::new(store, signer, clock)
    }
}

/// Builder for [`AppState`]
///
/// Registry clients default to the in-process registry, notifications default
/// to the log, and the gateway starts with no keys.
pub struct AppStateBuilder {
    store: Arc<dyn ParkingStore>,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    confirmer: Option<Arc<dyn VehicleOwnershipConfirmer>>,
    owner_lookup: Option<Arc<dyn VehicleOwnerLookup>>,
    notifier: Option<Arc<dyn Notifier>>,
    api_keys: Option<Arc<dyn ApiKeyBackend>>,
    service_key: Option<String>,
}

impl AppStateBuilder {
    pub fn new(store: Arc<dyn ParkingStore>, signer: TokenSigner, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            signer,
            clock,
            confirmer: None,
            owner_lookup: None,
            notifier: None,
            api_keys: None,
            service_key: None,
        }
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn VehicleOwnershipConfirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    pub fn with_owner_lookup(mut self, lookup: Arc<dyn VehicleOwnerLookup>) -> Self {
        self.owner_lookup = Some(lookup);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_api_keys(mut self, backend: Arc<dyn ApiKeyBackend>) -> Self {
        self.api_keys = Some(backend);
        self
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn build(self) -> AppState {
        let store = self.store;
        let clock = self.clock;
        let local = Arc::new(LocalRegistryClient::new(store.clone()));

        let confirmer: Arc<dyn VehicleOwnershipConfirmer> = match self.confirmer {
            Some(confirmer) => confirmer,
            None => local.clone(),
        };
        let owner_lookup: Arc<dyn VehicleOwnerLookup> = match self.owner_lookup {
            Some(lookup) => lookup,
            None => local,
        };
        let notifier: Arc<dyn Notifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(LogNotifier),
        };
        let api_keys: Arc<dyn ApiKeyBackend> = match self.api_keys {
            Some(backend) => backend,
            None => Arc::new(InMemoryApiKeyBackend::new(clock.clone())),
        };

        let credentials = Arc::new(StoreCredentials::new(store.clone()));
        let authenticator = SessionAuthenticator::new(Arc::new(self.signer), credentials);
        let registry = VehicleRegistry::new(store.clone());

        AppState {
            accounts: AccountService::new(store.clone(), authenticator.clone(), clock.clone()),
            catalog: CatalogService::new(store.clone()),
            permits: PermitEngine::new(
                store.clone(),
                registry.clone(),
                confirmer,
                notifier.clone(),
                clock.clone(),
            ),
            validity: ValidityChecker::new(store.clone(), registry.clone(), clock.clone()),
            tickets: TicketEngine::new(store.clone(), owner_lookup, notifier, clock),
            gateway: ApiKeyGuard::new(api_keys),
            authenticator,
            registry,
            store,
            service_key: self.service_key,
        }
    }
}
