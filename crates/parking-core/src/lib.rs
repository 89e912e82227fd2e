//! # Parking Core
//!
//! Domain types and rules for campus parking, free of any I/O.
//!
//! ## Key Concepts
//!
//! - **Principal**: an actor in exactly one role table (driver, enforcer, admin)
//! - **Vehicle**: identified among live registrations by `(plate, state)`
//! - **Permit window**: the closed interval `[active_from, expires_at]`
//! - **Ticket**: a citation moving through a fixed status graph
//!
//! ## Invariants
//!
//! 1. **No overlap**: non-deleted permits of one vehicle have disjoint windows
//! 2. **Derived validity**: a permit is valid at T iff `active_from <= T <= expires_at`
//!    and it is not deleted
//! 3. **Closed lifecycle**: ticket statuses only change along [`TicketAction`] edges

pub mod clock;
pub mod error;
pub mod permit;
pub mod ticket;
pub mod types;
pub mod vehicle;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ParkingError, Result};
pub use permit::{DurationClass, NewPermitType, Permit, PermitType, PermitWindow};
pub use ticket::{Ticket, TicketAction, TicketStatus};
pub use types::{Contact, Plate, Principal, RegionCode, Role, VehicleKey};
pub use vehicle::{NewVehicle, Vehicle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
