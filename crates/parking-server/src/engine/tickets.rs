//! Ticket Lifecycle Engine
//!
//! ```text
//! unpaid ──challenge──▶ challenged ──accept──▶ accepted
//!   │                       │
//!  pay                    reject
//!   ▼                       ▼
//!  paid ◀───────pay────── rejected
//! ```
//!
//! Every status change is one conditional update in the store. When it
//! matches no row, a follow-up read only decides which error to report.

use parking_auth::Session;
use parking_core::{ticket::validate_dispute, Clock, Role, Ticket, TicketAction, TicketStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use crate::clients::VehicleOwnerLookup;
use crate::notify::{dispatch, Notification, Notifier, NotifyError};
use crate::storage::{ParkingStore, TicketTransition};

/// Enforcer request for a citation
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTicketRequest {
    pub vehicle_id: Uuid,
    pub cost_cents: i64,
}

/// Registrar view of an account's outstanding tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpaidSummary {
    pub driver_id: Uuid,
    pub has_unpaid: bool,
    pub unpaid_count: usize,
    pub outstanding_cents: i64,
}

#[derive(Clone)]
pub struct TicketEngine {
    store: Arc<dyn ParkingStore>,
    owner_lookup: Arc<dyn VehicleOwnerLookup>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl TicketEngine {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        owner_lookup: Arc<dyn VehicleOwnerLookup>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            owner_lookup,
            notifier,
            clock,
        }
    }

    pub async fn issue(&self, enforcer: &Session, request: IssueTicketRequest) -> EngineResult<Ticket> {
        enforcer.require(Role::Enforcer)?;

        let vehicle = self
            .store
            .get_vehicle(request.vehicle_id)
            .await?
            .filter(|v| !v.deleted)
            .ok_or(EngineError::VehicleNotFound)?;

        let ticket = Ticket::issue(vehicle.id, request.cost_cents, self.clock.now())?;
        self.store.insert_ticket(ticket.clone()).await?;

        info!(
            ticket = %ticket.id,
            enforcer = %enforcer.subject_id,
            vehicle = %vehicle.id,
            cost_cents = ticket.cost_cents,
            deadline = %ticket.deadline,
            "Ticket issued"
        );

        let lookup = self.owner_lookup.clone();
        let issued = ticket.clone();
        dispatch(self.notifier.clone(), async move {
            let contact = lookup
                .owner_contact(issued.vehicle_id)
                .await
                .map_err(|e| NotifyError(e.to_string()))?;
            Ok(contact.map(|recipient| Notification::TicketIssued {
                recipient,
                ticket: issued,
            }))
        });

        Ok(ticket)
    }

    /// Pay a ticket on one of the caller's vehicles
    pub async fn pay(&self, driver: &Session, ticket_id: Uuid) -> EngineResult<Ticket> {
        driver.require(Role::Driver)?;
        let transition = TicketTransition::new(ticket_id, TicketAction::Pay).owned_by(driver.subject_id);
        let ticket = self.apply(transition).await?;

        let notification = Notification::TicketPaid {
            recipient: driver.contact(),
            ticket: ticket.clone(),
        };
        dispatch(self.notifier.clone(), async move { Ok(Some(notification)) });

        Ok(ticket)
    }

    /// Dispute an unpaid ticket on one of the caller's vehicles
    pub async fn challenge(&self, driver: &Session, ticket_id: Uuid, description: &str) -> EngineResult<Ticket> {
        driver.require(Role::Driver)?;
        let description = validate_dispute(description)?;
        let transition = TicketTransition::new(ticket_id, TicketAction::Challenge)
            .owned_by(driver.subject_id)
            .with_dispute(description);
        self.apply(transition).await
    }

    /// Pending disputes, most recent first; empty when there are none
    pub async fn list_challenges(&self, admin: &Session) -> EngineResult<Vec<Ticket>> {
        admin.require(Role::Admin)?;
        Ok(self.store.list_tickets_by_status(TicketStatus::Challenged).await?)
    }

    /// Forgive a disputed ticket
    pub async fn accept_challenge(&self, admin: &Session, ticket_id: Uuid) -> EngineResult<Ticket> {
        admin.require(Role::Admin)?;
        self.apply(TicketTransition::new(ticket_id, TicketAction::Accept)).await
    }

    /// Reinstate a disputed ticket as payable
    pub async fn reject_challenge(&self, admin: &Session, ticket_id: Uuid) -> EngineResult<Ticket> {
        admin.require(Role::Admin)?;
        self.apply(TicketTransition::new(ticket_id, TicketAction::Reject)).await
    }

    /// Tickets on the caller's vehicles, newest first
    pub async fn list_own(&self, driver: &Session) -> EngineResult<Vec<Ticket>> {
        driver.require(Role::Driver)?;
        Ok(self.store.list_tickets_for_owner(driver.subject_id).await?)
    }

    /// Whether an account has tickets still to pay
    pub async fn unpaid_summary(&self, driver_id: Uuid) -> EngineResult<UnpaidSummary> {
        if self.store.get_principal(Role::Driver, driver_id).await?.is_none() {
            return Err(EngineError::PrincipalNotFound("driver"));
        }

        let outstanding: Vec<Ticket> = self
            .store
            .list_tickets_for_owner(driver_id)
            .await?
            .into_iter()
            .filter(|t| t.status.is_outstanding())
            .collect();

        let outstanding_cents = outstanding
            .iter()
            .try_fold(0i64, |total, t| total.checked_add(t.cost_cents))
            .ok_or(EngineError::AmountOverflow("outstanding_cents"))?;

        Ok(UnpaidSummary {
            driver_id,
            has_unpaid: !outstanding.is_empty(),
            unpaid_count: outstanding.len(),
            outstanding_cents,
        })
    }

    async fn apply(&self, transition: TicketTransition) -> EngineResult<Ticket> {
        let ticket_id = transition.ticket_id;
        let action = transition.action;
        let owner_guard = transition.owner_guard;

        if let Some(ticket) = self.store.transition_ticket(transition).await? {
            info!(ticket = %ticket.id, action = %action, status = %ticket.status, "Ticket transitioned");
            return Ok(ticket);
        }

        Err(self.explain_miss(ticket_id, action, owner_guard).await?)
    }

    /// Classify a transition that matched no row
    async fn explain_miss(
        &self,
        ticket_id: Uuid,
        action: TicketAction,
        owner_guard: Option<Uuid>,
    ) -> EngineResult<EngineError> {
        let Some(ticket) = self.store.get_ticket(ticket_id).await? else {
            return Ok(EngineError::TicketNotFound);
        };

        if let Some(owner_id) = owner_guard {
            let owned = self
                .store
                .get_vehicle(ticket.vehicle_id)
                .await?
                .is_some_and(|v| v.owner_id == owner_id);
            if !owned {
                return Ok(EngineError::TicketNotFound);
            }
        }

        warn!(ticket = %ticket_id, action = %action, status = %ticket.status, "Rejected ticket transition");
        Ok(EngineError::InvalidTransition {
            action,
            from: ticket.status,
        })
    }
}
