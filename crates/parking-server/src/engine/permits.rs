//! Permit Issuance Engine
//!
//! Issuing a permit:
//!
//! 1. the caller must hold a driver session
//! 2. the Vehicle Registry must confirm the caller owns `(plate, state)`
//! 3. the permit type fixes the window through its duration class
//! 4. the store inserts the permit, rejecting any overlap atomically
//! 5. a notification is dispatched on a detached task
//!
//! Steps 1 to 3 write nothing. Step 4 is the only place an overlap is detected;
//! there is no read-then-insert pre-check.

use chrono::{DateTime, Utc};
use parking_auth::Session;
use parking_core::{Clock, Permit, PermitWindow, Role, VehicleKey};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use super::registry::VehicleRegistry;
use crate::clients::VehicleOwnershipConfirmer;
use crate::notify::{dispatch, Notification, Notifier};
use crate::storage::{ParkingStore, StorageError};

/// Driver request for a new permit
#[derive(Debug, Clone, Deserialize)]
pub struct IssuePermitRequest {
    pub plate: String,
    pub state: String,
    pub permit_type_id: Uuid,
    /// Defaults to the current instant
    #[serde(default)]
    pub active_from: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PermitEngine {
    store: Arc<dyn ParkingStore>,
    registry: VehicleRegistry,
    confirmer: Arc<dyn VehicleOwnershipConfirmer>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl PermitEngine {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        registry: VehicleRegistry,
        confirmer: Arc<dyn VehicleOwnershipConfirmer>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            confirmer,
            notifier,
            clock,
        }
    }

    pub async fn issue(&self, driver: &Session, request: IssuePermitRequest) -> EngineResult<Permit> {
        driver.require(Role::Driver)?;
        let key = VehicleKey::parse(&request.plate, &request.state)?;

        let vehicle = match self.confirmer.confirm_ownership(&key, driver.subject_id).await {
            Ok(Some(vehicle)) => vehicle,
            Ok(None) => {
                warn!(driver = %driver.subject_id, key = %key, "Ownership not confirmed");
                return Err(EngineError::VehicleNotConfirmed);
            }
            Err(e) => {
                warn!(driver = %driver.subject_id, key = %key, error = %e, "Ownership confirmation failed");
                return Err(EngineError::VehicleNotConfirmed);
            }
        };

        let permit_type = self
            .store
            .get_permit_type(request.permit_type_id)
            .await?
            .ok_or(EngineError::PermitTypeNotFound)?;

        let active_from = request.active_from.unwrap_or_else(|| self.clock.now());
        let window = PermitWindow::for_class(&permit_type.duration_class, active_from)?;
        let permit = Permit::new(driver.subject_id, vehicle.id, permit_type.id, window);

        self.store.insert_permit(permit.clone()).await.map_err(|e| match e {
            StorageError::Conflict(_) => EngineError::OverlappingPermit,
            other => EngineError::Storage(other),
        })?;

        info!(
            permit = %permit.id,
            driver = %driver.subject_id,
            vehicle = %vehicle.id,
            active_from = %permit.active_from,
            expires_at = %permit.expires_at,
            "Permit issued"
        );

        let notification = Notification::PermitIssued {
            recipient: driver.contact(),
            permit: permit.clone(),
        };
        dispatch(self.notifier.clone(), async move { Ok(Some(notification)) });

        Ok(permit)
    }

    /// Live permits held by the caller
    pub async fn list_own(&self, driver: &Session) -> EngineResult<Vec<Permit>> {
        driver.require(Role::Driver)?;
        Ok(self.store.list_permits_for_holder(driver.subject_id).await?)
    }

    /// Live permits of one of the caller's vehicles
    pub async fn list_for_vehicle(&self, driver: &Session, vehicle_id: Uuid) -> EngineResult<Vec<Permit>> {
        let vehicle = self.registry.owned(driver, vehicle_id).await?;
        Ok(self.store.list_permits_for_vehicle(vehicle.id).await?)
    }

    /// Admin soft-delete; the window becomes free for new permits
    pub async fn revoke(&self, admin: &Session, permit_id: Uuid) -> EngineResult<()> {
        admin.require(Role::Admin)?;
        if !self.store.soft_delete_permit(permit_id).await? {
            return Err(EngineError::PermitNotFound);
        }
        info!(admin = %admin.subject_id, permit = %permit_id, "Permit revoked");
        Ok(())
    }
}
