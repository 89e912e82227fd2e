//! Vehicle Registry clients
//!
//! The permit and ticket engines never reach into vehicle records directly.
//! They ask the registry through these two seams, which can be served
//! in-process ([`LocalRegistryClient`]) or over HTTP ([`HttpRegistryClient`]).
//! Tests substitute their own implementations.

use async_trait::async_trait;
use parking_core::{Contact, Role, Vehicle, VehicleKey};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::ParkingStore;

/// Header carrying the shared service key on internal registry routes
pub const SERVICE_KEY_HEADER: &str = "x-service-key";
pub const PLATE_HEADER: &str = "x-plate";
pub const STATE_HEADER: &str = "x-state";
pub const OWNER_HEADER: &str = "x-owner-id";

/// A registry call that could not be answered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("vehicle registry unavailable: {0}")]
pub struct UpstreamError(pub String);

/// "Does `(plate, state)` resolve to a live vehicle owned by this driver?"
#[async_trait]
pub trait VehicleOwnershipConfirmer: Send + Sync {
    /// The confirmed vehicle, or `None` when it is missing or owned by someone else
    async fn confirm_ownership(
        &self,
        key: &VehicleKey,
        driver_id: Uuid,
    ) -> Result<Option<Vehicle>, UpstreamError>;
}

/// "Who owns this vehicle, and how do we reach them?"
#[async_trait]
pub trait VehicleOwnerLookup: Send + Sync {
    async fn owner_contact(&self, vehicle_id: Uuid) -> Result<Option<Contact>, UpstreamError>;
}

// =============================================================================
// In-process registry
// =============================================================================

/// Answers registry questions from the local store
#[derive(Debug, Clone)]
pub struct LocalRegistryClient {
    store: Arc<dyn ParkingStore>,
}

impl LocalRegistryClient {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VehicleOwnershipConfirmer for LocalRegistryClient {
    async fn confirm_ownership(
        &self,
        key: &VehicleKey,
        driver_id: Uuid,
    ) -> Result<Option<Vehicle>, UpstreamError> {
        let vehicle = self
            .store
            .find_vehicle(key)
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;
        Ok(vehicle.filter(|v| v.is_owned_by(driver_id)))
    }
}

#[async_trait]
impl VehicleOwnerLookup for LocalRegistryClient {
    async fn owner_contact(&self, vehicle_id: Uuid) -> Result<Option<Contact>, UpstreamError> {
        let Some(vehicle) = self
            .store
            .get_vehicle(vehicle_id)
            .await
            .map_err(|e| UpstreamError(e.to_string()))?
        else {
            return Ok(None);
        };

        let owner = self
            .store
            .get_principal(Role::Driver, vehicle.owner_id)
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;
        Ok(owner.map(|record| Contact::from(&record.principal)))
    }
}

// =============================================================================
// Remote registry
// =============================================================================

/// Calls the registry's internal routes on another instance
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpRegistryClient {
    /// Every request is bounded by `timeout`; there are no retries
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, UpstreamError> {
        let response = request
            .header(SERVICE_KEY_HEADER, &self.service_key)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Registry request failed");
                UpstreamError(e.to_string())
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| UpstreamError(format!("malformed registry response: {}", e))),
            status => {
                warn!(status = %status, "Registry returned an error status");
                Err(UpstreamError(format!("registry returned {}", status)))
            }
        }
    }
}

#[async_trait]
impl VehicleOwnershipConfirmer for HttpRegistryClient {
    async fn confirm_ownership(
        &self,
        key: &VehicleKey,
        driver_id: Uuid,
    ) -> Result<Option<Vehicle>, UpstreamError> {
        debug!(key = %key, "Confirming ownership via registry");
        let request = self
            .client
            .get(format!("{}/internal/v1/vehicles/ownership", self.base_url))
            .header(PLATE_HEADER, key.plate.as_str())
            .header(STATE_HEADER, key.state.as_str())
            .header(OWNER_HEADER, driver_id.to_string());
        self.fetch(request).await
    }
}

#[async_trait]
impl VehicleOwnerLookup for HttpRegistryClient {
    async fn owner_contact(&self, vehicle_id: Uuid) -> Result<Option<Contact>, UpstreamError> {
        let request = self.client.get(format!(
            "{}/internal/v1/vehicles/{}/owner-contact",
            self.base_url, vehicle_id
        ));
        self.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, PrincipalRecord};
    use chrono::Utc;
    use parking_core::{NewVehicle, Principal};

    async fn seeded() -> (LocalRegistryClient, Vehicle, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        store
            .create_principal(PrincipalRecord {
                principal: Principal {
                    id: owner,
                    display_name: "Dana".into(),
                    email: "dana@campus.example".into(),
                    role: Role::Driver,
                },
                password_hash: "unused".into(),
                active: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let vehicle = NewVehicle {
            plate: "7abc123".into(),
            state: "ca".into(),
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2019,
            color: "Blue".into(),
        }
        .into_vehicle(owner)
        .unwrap();
        store.insert_vehicle(vehicle.clone()).await.unwrap();

        (LocalRegistryClient::new(store), vehicle, owner)
    }

    #[tokio::test]
    async fn test_local_confirms_only_owner() {
        let (client, vehicle, owner) = seeded().await;
        let key = vehicle.key();

        let confirmed = client.confirm_ownership(&key, owner).await.unwrap();
        assert_eq!(confirmed.map(|v| v.id), Some(vehicle.id));

        assert!(client.confirm_ownership(&key, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_owner_contact() {
        let (client, vehicle, owner) = seeded().await;
        let contact = client.owner_contact(vehicle.id).await.unwrap().unwrap();
        assert_eq!(contact.principal_id, owner);
        assert_eq!(contact.email, "dana@campus.example");

        assert!(client.owner_contact(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_http_client_unreachable_is_upstream_error() {
        let client =
            HttpRegistryClient::new("http://127.0.0.1:9", "svc", Duration::from_millis(200)).unwrap();
        let key = VehicleKey::parse("7ABC123", "CA").unwrap();
        assert!(client.confirm_ownership(&key, Uuid::new_v4()).await.is_err());
    }
}
