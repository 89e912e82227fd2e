//! Citation lifecycle
//!
//! ```text
//! unpaid ──challenge──▶ challenged ──accept──▶ accepted
//!   │                       │
//!   │                     reject
//!   │                       ▼
//!   └────────pay──────▶ paid ◀──pay── rejected
//! ```
//!
//! `accepted` and `paid` are terminal. A `rejected` ticket is payable but may
//! not be challenged again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParkingError, Result};

/// Days a driver has to settle a ticket
pub const PAYMENT_WINDOW_DAYS: i64 = 21;

/// Largest fine a single ticket may carry (100,000.00)
pub const MAX_TICKET_CENTS: i64 = 10_000_000;

/// Longest accepted dispute description
pub const MAX_DISPUTE_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Unpaid,
    Challenged,
    Accepted,
    Rejected,
    Paid,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Unpaid,
        TicketStatus::Challenged,
        TicketStatus::Accepted,
        TicketStatus::Rejected,
        TicketStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Unpaid => "unpaid",
            TicketStatus::Challenged => "challenged",
            TicketStatus::Accepted => "accepted",
            TicketStatus::Rejected => "rejected",
            TicketStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Accepted | TicketStatus::Paid)
    }

    /// Money is still owed on the ticket
    pub fn is_outstanding(&self) -> bool {
        matches!(self, TicketStatus::Unpaid | TicketStatus::Rejected)
    }

    /// Apply `action`, returning the resulting status or the refusal
    pub fn apply(self, action: TicketAction) -> Result<TicketStatus> {
        if action.sources().contains(&self) {
            Ok(action.target())
        } else {
            Err(ParkingError::InvalidTransition { action, from: self })
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParkingError::invalid("status", format!("unknown ticket status '{}'", s)))
    }
}

/// The four ways a ticket's status can change after issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketAction {
    Pay,
    Challenge,
    Accept,
    Reject,
}

impl TicketAction {
    pub const ALL: [TicketAction; 4] = [
        TicketAction::Pay,
        TicketAction::Challenge,
        TicketAction::Accept,
        TicketAction::Reject,
    ];

    /// Statuses this action may be applied from
    ///
    /// Storage backends use this list as the guard of their conditional update.
    pub fn sources(&self) -> &'static [TicketStatus] {
        match self {
            TicketAction::Pay => &[TicketStatus::Unpaid, TicketStatus::Rejected],
            TicketAction::Challenge => &[TicketStatus::Unpaid],
            TicketAction::Accept | TicketAction::Reject => &[TicketStatus::Challenged],
        }
    }

    pub fn target(&self) -> TicketStatus {
        match self {
            TicketAction::Pay => TicketStatus::Paid,
            TicketAction::Challenge => TicketStatus::Challenged,
            TicketAction::Accept => TicketStatus::Accepted,
            TicketAction::Reject => TicketStatus::Rejected,
        }
    }
}

impl std::fmt::Display for TicketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            TicketAction::Pay => "pay",
            TicketAction::Challenge => "challenge",
            TicketAction::Accept => "accept",
            TicketAction::Reject => "reject",
        };
        f.write_str(verb)
    }
}

/// A parking citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    /// Fine in cents
    pub cost_cents: i64,
    pub issued_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispute_description: Option<String>,
}

impl Ticket {
    /// Build a fresh `unpaid` ticket issued at `issued_at`
    pub fn issue(vehicle_id: Uuid, cost_cents: i64, issued_at: DateTime<Utc>) -> Result<Self> {
        if cost_cents <= 0 {
            return Err(ParkingError::invalid("cost_cents", "must be positive"));
        }
        if cost_cents > MAX_TICKET_CENTS {
            return Err(ParkingError::invalid(
                "cost_cents",
                format!("must be at most {}", MAX_TICKET_CENTS),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            vehicle_id,
            cost_cents,
            issued_at,
            deadline: issued_at + Duration::days(PAYMENT_WINDOW_DAYS),
            status: TicketStatus::Unpaid,
            dispute_description: None,
        })
    }
}

/// Validate and trim a driver's dispute text
pub fn validate_dispute(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ParkingError::invalid("description", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_DISPUTE_LEN {
        return Err(ParkingError::invalid(
            "description",
            format!("at most {} characters", MAX_DISPUTE_LEN),
        ));
    }
    Ok(trimmed.to_string())
}
