//! Error types for the parking domain

use thiserror::Error;

use crate::ticket::{TicketAction, TicketStatus};

/// Result type alias using ParkingError
pub type Result<T> = std::result::Result<T, ParkingError>;

/// Errors raised by pure domain rules
///
/// These never involve I/O: they describe input that has the wrong shape or a
/// request the domain model itself forbids.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParkingError {
    /// A field failed shape validation
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A ticket action is not allowed from the ticket's current status
    #[error("Cannot {action} a ticket that is {from}")]
    InvalidTransition {
        action: TicketAction,
        from: TicketStatus,
    },

    /// No expiry rule is defined for this duration class
    #[error("No expiration rule for duration class '{0}'")]
    UnsupportedDurationClass(String),

    /// A permit window whose end precedes its start
    #[error("Permit window ends at {expires_at} before it starts at {active_from}")]
    InvertedWindow {
        active_from: String,
        expires_at: String,
    },
}

impl ParkingError {
    /// Shorthand for a validation failure on a named field
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ParkingError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
