//! In-memory storage backend
//!
//! Default storage implementation using in-memory hashmaps.
//! Suitable for development, tests and single-instance deployments.
//! Data is lost on restart.
//!
//! Every table sits behind one lock, so a constraint check and the write it
//! guards always happen under the same write guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_core::{
    Permit, PermitType, Principal, Role, Ticket, TicketStatus, Vehicle, VehicleKey,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ParkingStore, PrincipalRecord, StorageError, TicketTransition};

#[derive(Debug, Default)]
struct Tables {
    principals: HashMap<(Role, Uuid), PrincipalRecord>,
    vehicles: HashMap<Uuid, Vehicle>,
    permit_types: HashMap<Uuid, PermitType>,
    permits: HashMap<Uuid, Permit>,
    tickets: HashMap<Uuid, Ticket>,
}

/// In-memory parking store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ParkingStore for MemoryStore {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    // =========================================================================
    // Principals
    // =========================================================================

    async fn create_principal(&self, record: PrincipalRecord) -> Result<(), StorageError> {
        let mut tables = self.write();
        let role = record.principal.role;
        let taken = tables
            .principals
            .values()
            .any(|r| r.principal.role == role && r.principal.email == record.principal.email);
        if taken {
            return Err(StorageError::Conflict(format!(
                "{} email already registered",
                role
            )));
        }
        info!(role = %role, id = %record.principal.id, "Storing principal");
        tables.principals.insert((role, record.principal.id), record);
        Ok(())
    }

    async fn get_principal(&self, role: Role, id: Uuid) -> Result<Option<PrincipalRecord>, StorageError> {
        Ok(self.read().principals.get(&(role, id)).cloned())
    }

    async fn find_principal_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, StorageError> {
        let tables = self.read();
        Ok(tables
            .principals
            .values()
            .find(|r| r.principal.role == role && r.principal.email == email)
            .cloned())
    }

    async fn list_principals(&self, role: Role) -> Result<Vec<Principal>, StorageError> {
        let tables = self.read();
        let mut records: Vec<&PrincipalRecord> = tables
            .principals
            .values()
            .filter(|r| r.principal.role == role && r.active)
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records.into_iter().map(|r| r.principal.clone()).collect())
    }

    async fn deactivate_principal(&self, role: Role, id: Uuid) -> Result<bool, StorageError> {
        let mut tables = self.write();
        match tables.principals.get_mut(&(role, id)) {
            Some(record) => {
                record.active = false;
                info!(role = %role, id = %id, "Deactivated principal");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_principal(&self, role: Role, id: Uuid) -> Result<bool, StorageError> {
        let removed = self.write().principals.remove(&(role, id)).is_some();
        if removed {
            info!(role = %role, id = %id, "Deleted principal");
        }
        Ok(removed)
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    async fn insert_vehicle(&self, vehicle: Vehicle) -> Result<(), StorageError> {
        let mut tables = self.write();
        let key = vehicle.key();
        if tables.vehicles.values().any(|v| !v.deleted && v.key() == key) {
            return Err(StorageError::Conflict(format!("vehicle {} already registered", key)));
        }
        info!(vehicle = %vehicle.id, key = %key, "Storing vehicle");
        tables.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StorageError> {
        Ok(self.read().vehicles.get(&id).cloned())
    }

    async fn find_vehicle(&self, key: &VehicleKey) -> Result<Option<Vehicle>, StorageError> {
        let tables = self.read();
        Ok(tables
            .vehicles
            .values()
            .find(|v| !v.deleted && &v.key() == key)
            .cloned())
    }

    async fn list_vehicles_for_owner(&self, owner_id: Uuid) -> Result<Vec<Vehicle>, StorageError> {
        let tables = self.read();
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| v.is_owned_by(owner_id))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.plate.cmp(&b.plate).then_with(|| a.state.cmp(&b.state)));
        Ok(vehicles)
    }

    async fn soft_delete_vehicle(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StorageError> {
        let mut tables = self.write();
        match tables.vehicles.get_mut(&id) {
            Some(vehicle) if vehicle.is_owned_by(owner_id) => {
                vehicle.deleted = true;
                info!(vehicle = %id, "Soft-deleted vehicle");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Permit Catalog
    // =========================================================================

    async fn insert_permit_type(&self, permit_type: PermitType) -> Result<(), StorageError> {
        let mut tables = self.write();
        info!(permit_type = %permit_type.id, class = %permit_type.class_name, "Storing permit type");
        tables.permit_types.insert(permit_type.id, permit_type);
        Ok(())
    }

    async fn get_permit_type(&self, id: Uuid) -> Result<Option<PermitType>, StorageError> {
        Ok(self.read().permit_types.get(&id).filter(|t| !t.deleted).cloned())
    }

    async fn list_permit_types(&self) -> Result<Vec<PermitType>, StorageError> {
        let tables = self.read();
        let mut types: Vec<PermitType> = tables
            .permit_types
            .values()
            .filter(|t| !t.deleted)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        Ok(types)
    }

    async fn update_permit_type_price(
        &self,
        id: Uuid,
        price_cents: i64,
    ) -> Result<Option<PermitType>, StorageError> {
        let mut tables = self.write();
        match tables.permit_types.get_mut(&id) {
            Some(permit_type) if !permit_type.deleted => {
                permit_type.price_cents = price_cents;
                Ok(Some(permit_type.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_permit_type(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut tables = self.write();
        match tables.permit_types.get_mut(&id) {
            Some(permit_type) if !permit_type.deleted => {
                permit_type.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Permits
    // =========================================================================

    async fn insert_permit(&self, permit: Permit) -> Result<(), StorageError> {
        let mut tables = self.write();

        if let Some(existing) = tables.permits.values().find(|p| p.conflicts_with(&permit)) {
            warn!(
                vehicle = %permit.vehicle_id,
                existing = %existing.id,
                "Permit window overlaps an existing permit"
            );
            return Err(StorageError::Conflict(format!(
                "permit window overlaps permit {}",
                existing.id
            )));
        }

        info!(permit = %permit.id, vehicle = %permit.vehicle_id, "Storing permit");
        tables.permits.insert(permit.id, permit);
        Ok(())
    }

    async fn list_permits_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Permit>, StorageError> {
        let tables = self.read();
        let mut permits: Vec<Permit> = tables
            .permits
            .values()
            .filter(|p| !p.deleted && p.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        permits.sort_by_key(|p| p.active_from);
        Ok(permits)
    }

    async fn list_permits_for_holder(&self, holder_id: Uuid) -> Result<Vec<Permit>, StorageError> {
        let tables = self.read();
        let mut permits: Vec<Permit> = tables
            .permits
            .values()
            .filter(|p| !p.deleted && p.holder_id == holder_id)
            .cloned()
            .collect();
        permits.sort_by_key(|p| p.active_from);
        Ok(permits)
    }

    async fn soft_delete_permit(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut tables = self.write();
        match tables.permits.get_mut(&id) {
            Some(permit) if !permit.deleted => {
                permit.deleted = true;
                info!(permit = %id, "Soft-deleted permit");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn has_valid_permit(&self, vehicle_id: Uuid, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let tables = self.read();
        Ok(tables
            .permits
            .values()
            .any(|p| p.vehicle_id == vehicle_id && p.is_valid_at(at)))
    }

    // =========================================================================
    // Tickets
    // =========================================================================

    async fn insert_ticket(&self, ticket: Ticket) -> Result<(), StorageError> {
        let mut tables = self.write();
        info!(ticket = %ticket.id, vehicle = %ticket.vehicle_id, "Storing ticket");
        tables.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StorageError> {
        Ok(self.read().tickets.get(&id).cloned())
    }

    async fn transition_ticket(&self, transition: TicketTransition) -> Result<Option<Ticket>, StorageError> {
        let mut guard = self.write();
        let tables = &mut *guard;

        let Some(ticket) = tables.tickets.get_mut(&transition.ticket_id) else {
            return Ok(None);
        };

        if let Some(owner_id) = transition.owner_guard {
            let owned = tables
                .vehicles
                .get(&ticket.vehicle_id)
                .is_some_and(|v| v.owner_id == owner_id);
            if !owned {
                return Ok(None);
            }
        }

        if !transition.sources().contains(&ticket.status) {
            return Ok(None);
        }

        ticket.status = transition.target();
        if let Some(description) = transition.dispute_description {
            ticket.dispute_description = Some(description);
        }
        debug!(ticket = %ticket.id, status = %ticket.status, "Ticket transitioned");
        Ok(Some(ticket.clone()))
    }

    async fn list_tickets_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StorageError> {
        let tables = self.read();
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(tickets)
    }

    async fn list_tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<Ticket>, StorageError> {
        let tables = self.read();
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| {
                tables
                    .vehicles
                    .get(&t.vehicle_id)
                    .is_some_and(|v| v.owner_id == owner_id)
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(tickets)
    }
}
