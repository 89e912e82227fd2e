//! Domain engines
//!
//! Each engine takes an already authenticated [`parking_auth::Session`] and
//! checks it holds the role the operation needs before touching the store.

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod permits;
pub mod registry;
pub mod tickets;
pub mod validity;

pub use accounts::{AccountService, NewAccount};
pub use catalog::CatalogService;
pub use error::{EngineError, EngineResult};
pub use permits::{IssuePermitRequest, PermitEngine};
pub use registry::VehicleRegistry;
pub use tickets::{IssueTicketRequest, TicketEngine, UnpaidSummary};
pub use validity::{ValidityChecker, ValidityReport};
