//! Vehicle Registry
//!
//! Owns vehicle records. Drivers manage their own vehicles; enforcers may look
//! up any live plate; other components ask ownership questions through
//! [`crate::clients`].

use parking_auth::Session;
use parking_core::{Contact, NewVehicle, Role, Vehicle, VehicleKey};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use crate::clients::{LocalRegistryClient, UpstreamError, VehicleOwnerLookup, VehicleOwnershipConfirmer};
use crate::storage::{ParkingStore, StorageError};

#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    store: Arc<dyn ParkingStore>,
    local: LocalRegistryClient,
}

impl VehicleRegistry {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self {
            local: LocalRegistryClient::new(store.clone()),
            store,
        }
    }

    /// Register a vehicle to the calling driver
    pub async fn register(&self, driver: &Session, request: NewVehicle) -> EngineResult<Vehicle> {
        driver.require(Role::Driver)?;
        let vehicle = request.into_vehicle(driver.subject_id)?;

        self.store.insert_vehicle(vehicle.clone()).await.map_err(|e| match e {
            StorageError::Conflict(_) => EngineError::DuplicateVehicle,
            other => EngineError::Storage(other),
        })?;

        info!(driver = %driver.subject_id, vehicle = %vehicle.id, key = %vehicle.key(), "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn list_own(&self, driver: &Session) -> EngineResult<Vec<Vehicle>> {
        driver.require(Role::Driver)?;
        Ok(self.store.list_vehicles_for_owner(driver.subject_id).await?)
    }

    /// Soft-delete one of the caller's vehicles
    pub async fn remove(&self, driver: &Session, vehicle_id: Uuid) -> EngineResult<()> {
        driver.require(Role::Driver)?;
        if !self.store.soft_delete_vehicle(vehicle_id, driver.subject_id).await? {
            return Err(EngineError::VehicleNotFound);
        }
        info!(driver = %driver.subject_id, vehicle = %vehicle_id, "Vehicle retired");
        Ok(())
    }

    /// A live vehicle owned by the caller
    pub async fn owned(&self, driver: &Session, vehicle_id: Uuid) -> EngineResult<Vehicle> {
        driver.require(Role::Driver)?;
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .filter(|v| v.is_owned_by(driver.subject_id))
            .ok_or(EngineError::VehicleNotFound)
    }

    /// Enforcer lookup, no ownership check
    pub async fn lookup(&self, enforcer: &Session, plate: &str, state: &str) -> EngineResult<Vehicle> {
        enforcer.require(Role::Enforcer)?;
        let key = VehicleKey::parse(plate, state)?;
        self.find(&key).await
    }

    /// Resolve a natural key among live vehicles
    pub async fn find(&self, key: &VehicleKey) -> EngineResult<Vehicle> {
        debug!(key = %key, "Resolving plate");
        self.store
            .find_vehicle(key)
            .await?
            .ok_or(EngineError::VehicleNotFound)
    }

    /// Ownership confirmation, as served on the internal RPC route
    pub async fn confirm_ownership(
        &self,
        key: &VehicleKey,
        driver_id: Uuid,
    ) -> Result<Option<Vehicle>, UpstreamError> {
        self.local.confirm_ownership(key, driver_id).await
    }

    /// Owner contact lookup, as served on the internal RPC route
    pub async fn owner_contact(&self, vehicle_id: Uuid) -> Result<Option<Contact>, UpstreamError> {
        self.local.owner_contact(vehicle_id).await
    }
}
