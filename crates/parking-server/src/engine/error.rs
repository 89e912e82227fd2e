//! Domain operation errors

use parking_auth::AuthError;
use parking_core::{ParkingError, TicketAction, TicketStatus};
use thiserror::Error;

use crate::storage::StorageError;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the parking engines
#[derive(Error, Debug)]
pub enum EngineError {
    /// Authentication or role failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Vehicle not found")]
    VehicleNotFound,

    #[error("Ticket not found")]
    TicketNotFound,

    #[error("Permit type not found")]
    PermitTypeNotFound,

    #[error("Permit not found")]
    PermitNotFound,

    #[error("{0} not found")]
    PrincipalNotFound(&'static str),

    /// The registry did not confirm the caller owns the vehicle
    #[error("Vehicle ownership could not be confirmed")]
    VehicleNotConfirmed,

    #[error("Permit overlaps an existing permit for this vehicle")]
    OverlappingPermit,

    #[error("Vehicle is already registered")]
    DuplicateVehicle,

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("Cannot {action} a ticket that is {from}")]
    InvalidTransition { action: TicketAction, from: TicketStatus },

    #[error("Unsupported duration class: {0}")]
    UnsupportedDurationClass(String),

    #[error(transparent)]
    Validation(ParkingError),

    /// A monetary total left the representable range
    #[error("Amount overflow: {0}")]
    AmountOverflow(&'static str),

    /// A required cross-service call failed or timed out
    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ParkingError> for EngineError {
    fn from(err: ParkingError) -> Self {
        match err {
            ParkingError::InvalidTransition { action, from } => {
                EngineError::InvalidTransition { action, from }
            }
            ParkingError::UnsupportedDurationClass(class) => {
                EngineError::UnsupportedDurationClass(class)
            }
            other => EngineError::Validation(other),
        }
    }
}
