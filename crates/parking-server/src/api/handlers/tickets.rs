//! Ticket Handlers
//!
//! Issuance by enforcers, payment and disputes by drivers, dispute review by
//! admins. Every state change is a single guarded write in the engine; a
//! 409 `INVALID_TRANSITION` means the ticket exists but was not in a state
//! the action accepts.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use parking_auth::Session;
use parking_core::Ticket;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::engine::IssueTicketRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub count: usize,
}

impl From<Vec<Ticket>> for ListTicketsResponse {
    fn from(tickets: Vec<Ticket>) -> Self {
        Self {
            count: tickets.len(),
            tickets,
        }
    }
}

/// POST /v1/enforcer/tickets
pub async fn issue_ticket(
    State(state): State<Arc<AppState>>,
    Extension(enforcer): Extension<Session>,
    request: Result<Json<IssueTicketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(request) = request?;
    let ticket = state.tickets.issue(&enforcer, request).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /v1/driver/tickets
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    Ok(Json(state.tickets.list_own(&driver).await?.into()))
}

/// POST /v1/driver/tickets/{id}/pay
pub async fn pay_ticket(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    ticket_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    Ok(Json(state.tickets.pay(&driver, ticket_id).await?))
}

/// POST /v1/driver/tickets/{id}/challenge
pub async fn challenge_ticket(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    ticket_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    let Json(request) = request?;
    let ticket = state
        .tickets
        .challenge(&driver, ticket_id, &request.description)
        .await?;
    Ok(Json(ticket))
}

/// GET /v1/admin/challenges
pub async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    Ok(Json(state.tickets.list_challenges(&admin).await?.into()))
}

/// POST /v1/admin/tickets/{id}/accept
pub async fn accept_challenge(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    ticket_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    Ok(Json(state.tickets.accept_challenge(&admin, ticket_id).await?))
}

/// POST /v1/admin/tickets/{id}/reject
pub async fn reject_challenge(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    ticket_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    Ok(Json(state.tickets.reject_challenge(&admin, ticket_id).await?))
}
