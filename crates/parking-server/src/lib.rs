//! Parking Server
//!
//! The campus parking service:
//! - Role-scoped sessions for drivers, enforcers and admins
//! - Permit purchase with a storage-enforced no-overlap rule per vehicle
//! - Citation issuance, payment and the dispute workflow
//! - Read-only gateway views for police and the registrar
//!
//! ## API Endpoints
//!
//! ### Public
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check against the store
//! - `POST /v1/drivers` - Driver signup
//! - `POST /v1/sessions/{role}` - Log in as driver, enforcer or admin
//! - `GET /v1/permit-types` - Permit catalog
//!
//! ### Driver session
//! - `GET /v1/driver/me`
//! - `POST|GET /v1/driver/vehicles`, `DELETE /v1/driver/vehicles/{id}`
//! - `GET /v1/driver/vehicles/{id}/permits`
//! - `POST|GET /v1/driver/permits`
//! - `GET /v1/driver/tickets`
//! - `POST /v1/driver/tickets/{id}/pay`, `POST /v1/driver/tickets/{id}/challenge`
//!
//! ### Enforcer session
//! - `GET /v1/enforcer/vehicles?plate=&state=`
//! - `GET /v1/enforcer/validity?plate=&state=`
//! - `POST /v1/enforcer/tickets`
//!
//! ### Admin session
//! - `POST|GET /v1/admin/enforcers`, `DELETE /v1/admin/enforcers/{id}`
//! - `POST /v1/admin/admins`
//! - `POST /v1/admin/principals/{role}/{id}/deactivate`
//! - `POST /v1/admin/permit-types`, `PATCH|DELETE /v1/admin/permit-types/{id}`
//! - `DELETE /v1/admin/permits/{id}`
//! - `GET /v1/admin/challenges`, `POST /v1/admin/tickets/{id}/accept|reject`
//!
//! ### Gateway (`X-Api-Key`)
//! - `GET /v1/gateway/validity?plate=&state=` - police scope
//! - `GET /v1/gateway/accounts/{driver_id}/unpaid` - registrar scope
//!
//! ### Internal registry (`X-Service-Key`, only when configured)
//! - `GET /internal/v1/vehicles/ownership`
//! - `GET /internal/v1/vehicles/{id}/owner-contact`

pub mod api;
pub mod clients;
pub mod config;
pub mod engine;
pub mod notify;
pub mod state;
pub mod storage;

pub use api::create_router;
pub use clients::{HttpRegistryClient, LocalRegistryClient, UpstreamError, VehicleOwnerLookup, VehicleOwnershipConfirmer};
pub use config::{ConfigError, ServerConfig};
pub use engine::EngineError;
pub use notify::{LogNotifier, Notification, Notifier, WebhookNotifier};
pub use state::{AppState, AppStateBuilder};
pub use storage::{MemoryStore, ParkingStore, StorageError};

#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
