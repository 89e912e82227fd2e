//! Storage abstraction for the parking service
//!
//! One trait covers every persisted table so that engines can run against the
//! in-memory store (default) or PostgreSQL without change.
//!
//! Two rules are the store's responsibility, not the caller's:
//! - no two live permits of one vehicle may have intersecting windows
//!   ([`ParkingStore::insert_permit`] reports [`StorageError::Conflict`])
//! - ticket transitions are single conditional updates
//!   ([`ParkingStore::transition_ticket`])

pub mod credentials;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use credentials::StoreCredentials;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_core::{
    Permit, PermitType, Principal, Role, Ticket, TicketAction, TicketStatus, Vehicle, VehicleKey,
};
use std::fmt::Debug;
use uuid::Uuid;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness or exclusion constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// A principal row with its credential columns
#[derive(Clone)]
pub struct PrincipalRecord {
    pub principal: Principal,
    pub password_hash: String,
    /// Deactivated principals stay in their table but cannot authenticate
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Debug for PrincipalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalRecord")
            .field("principal", &self.principal)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// A requested ticket status change
#[derive(Debug, Clone)]
pub struct TicketTransition {
    pub ticket_id: Uuid,
    pub action: TicketAction,
    /// When set, the ticketed vehicle must belong to this driver
    pub owner_guard: Option<Uuid>,
    /// Recorded alongside a challenge
    pub dispute_description: Option<String>,
}

impl TicketTransition {
    pub fn new(ticket_id: Uuid, action: TicketAction) -> Self {
        Self {
            ticket_id,
            action,
            owner_guard: None,
            dispute_description: None,
        }
    }

    pub fn owned_by(mut self, driver_id: Uuid) -> Self {
        self.owner_guard = Some(driver_id);
        self
    }

    pub fn with_dispute(mut self, description: String) -> Self {
        self.dispute_description = Some(description);
        self
    }

    /// Statuses the update is allowed to start from
    pub fn sources(&self) -> &'static [TicketStatus] {
        self.action.sources()
    }

    pub fn target(&self) -> TicketStatus {
        self.action.target()
    }
}

/// Storage backend trait for parking state
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait ParkingStore: Send + Sync + Debug {
    /// Cheap reachability check for readiness
    async fn ping(&self) -> Result<(), StorageError>;

    // =========================================================================
    // Principals
    // =========================================================================

    /// Insert a principal; `Conflict` if the email is taken within its role
    async fn create_principal(&self, record: PrincipalRecord) -> Result<(), StorageError>;

    /// Fetch a principal from the table for `role`, active or not
    async fn get_principal(&self, role: Role, id: Uuid) -> Result<Option<PrincipalRecord>, StorageError>;

    /// Fetch a principal by normalized email from the table for `role`
    async fn find_principal_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, StorageError>;

    /// List active principals of a role, oldest first
    async fn list_principals(&self, role: Role) -> Result<Vec<Principal>, StorageError>;

    /// Mark a principal inactive; false if it does not exist
    async fn deactivate_principal(&self, role: Role, id: Uuid) -> Result<bool, StorageError>;

    /// Remove a principal row outright; false if it does not exist
    async fn delete_principal(&self, role: Role, id: Uuid) -> Result<bool, StorageError>;

    // =========================================================================
    // Vehicles
    // =========================================================================

    /// Insert a vehicle; `Conflict` if its `(plate, state)` is live elsewhere
    async fn insert_vehicle(&self, vehicle: Vehicle) -> Result<(), StorageError>;

    /// Fetch a vehicle by id, including soft-deleted rows
    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StorageError>;

    /// Resolve a natural key among non-deleted vehicles
    async fn find_vehicle(&self, key: &VehicleKey) -> Result<Option<Vehicle>, StorageError>;

    /// Non-deleted vehicles of one owner
    async fn list_vehicles_for_owner(&self, owner_id: Uuid) -> Result<Vec<Vehicle>, StorageError>;

    /// Soft-delete a live vehicle if `owner_id` owns it
    async fn soft_delete_vehicle(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StorageError>;

    // =========================================================================
    // Permit Catalog
    // =========================================================================

    async fn insert_permit_type(&self, permit_type: PermitType) -> Result<(), StorageError>;

    /// Fetch a non-deleted permit type
    async fn get_permit_type(&self, id: Uuid) -> Result<Option<PermitType>, StorageError>;

    /// Non-deleted permit types ordered by class name
    async fn list_permit_types(&self) -> Result<Vec<PermitType>, StorageError>;

    /// Change the price of a live permit type, returning the updated row
    async fn update_permit_type_price(
        &self,
        id: Uuid,
        price_cents: i64,
    ) -> Result<Option<PermitType>, StorageError>;

    async fn soft_delete_permit_type(&self, id: Uuid) -> Result<bool, StorageError>;

    // =========================================================================
    // Permits
    // =========================================================================

    /// Insert a permit
    ///
    /// Must fail with `Conflict`, writing nothing, when the new window
    /// intersects a live permit of the same vehicle. The check and the write
    /// are one atomic step.
    async fn insert_permit(&self, permit: Permit) -> Result<(), StorageError>;

    /// Live permits of one vehicle ordered by start
    async fn list_permits_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Permit>, StorageError>;

    /// Live permits held by one driver ordered by start
    async fn list_permits_for_holder(&self, holder_id: Uuid) -> Result<Vec<Permit>, StorageError>;

    async fn soft_delete_permit(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Whether any live permit of the vehicle contains `at`
    async fn has_valid_permit(&self, vehicle_id: Uuid, at: DateTime<Utc>) -> Result<bool, StorageError>;

    // =========================================================================
    // Tickets
    // =========================================================================

    async fn insert_ticket(&self, ticket: Ticket) -> Result<(), StorageError>;

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StorageError>;

    /// Apply a transition as one conditional update
    ///
    /// Returns the updated ticket, or `None` when no row matched the id, the
    /// allowed source statuses and the owner guard.
    async fn transition_ticket(&self, transition: TicketTransition) -> Result<Option<Ticket>, StorageError>;

    /// Tickets in one status, most recently issued first
    async fn list_tickets_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StorageError>;

    /// Tickets on any vehicle (deleted or not) owned by a driver, newest first
    async fn list_tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<Ticket>, StorageError>;
}
