//! Permit Validity Checker
//!
//! A pure read evaluated against the store at the current instant. Nothing is
//! cached: a permit committed a moment ago is visible to the next check.

use chrono::{DateTime, Utc};
use parking_auth::Session;
use parking_core::{Clock, Role, VehicleKey};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::error::EngineResult;
use super::registry::VehicleRegistry;
use crate::storage::ParkingStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityReport {
    pub vehicle_id: Uuid,
    pub valid: bool,
    pub checked_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ValidityChecker {
    store: Arc<dyn ParkingStore>,
    registry: VehicleRegistry,
    clock: Arc<dyn Clock>,
}

impl ValidityChecker {
    pub fn new(store: Arc<dyn ParkingStore>, registry: VehicleRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    /// Enforcer check of any plate
    pub async fn check(&self, enforcer: &Session, plate: &str, state: &str) -> EngineResult<ValidityReport> {
        enforcer.require(Role::Enforcer)?;
        self.check_plate(plate, state).await
    }

    /// The same question for key-authenticated gateway callers
    pub async fn check_plate(&self, plate: &str, state: &str) -> EngineResult<ValidityReport> {
        let key = VehicleKey::parse(plate, state)?;
        let vehicle = self.registry.find(&key).await?;

        let checked_at = self.clock.now();
        let valid = self.store.has_valid_permit(vehicle.id, checked_at).await?;
        debug!(key = %key, valid, "Validity checked");

        Ok(ValidityReport {
            vehicle_id: vehicle.id,
            valid,
            checked_at,
        })
    }
}
