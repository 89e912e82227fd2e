//! Permit Handlers

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use parking_auth::Session;
use parking_core::Permit;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::vehicles::{ListPermitsResponse, PlateQuery};
use crate::api::error::ApiError;
use crate::engine::{IssuePermitRequest, ValidityReport};
use crate::state::AppState;

/// Purchase a permit for one of the caller's vehicles
///
/// POST /v1/driver/permits
///
/// Returns 403 when the registry does not confirm ownership and 409 when the
/// new window overlaps a live permit on the same vehicle.
pub async fn issue_permit(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    request: Result<Json<IssuePermitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Permit>), ApiError> {
    let Json(request) = request?;
    let permit = state.permits.issue(&driver, request).await?;
    Ok((StatusCode::CREATED, Json(permit)))
}

/// GET /v1/driver/permits
pub async fn list_permits(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
) -> Result<Json<ListPermitsResponse>, ApiError> {
    let permits = state.permits.list_own(&driver).await?;
    Ok(Json(permits.into()))
}

/// DELETE /v1/admin/permits/{id}
pub async fn revoke_permit(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    permit_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(permit_id) = permit_id?;
    state.permits.revoke(&admin, permit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/enforcer/validity?plate=&state=
pub async fn check_validity(
    State(state): State<Arc<AppState>>,
    Extension(enforcer): Extension<Session>,
    query: Result<Query<PlateQuery>, QueryRejection>,
) -> Result<Json<ValidityReport>, ApiError> {
    let Query(query) = query?;
    let report = state
        .validity
        .check(&enforcer, &query.plate, &query.state)
        .await?;

    info!(
        enforcer = %enforcer.subject_id,
        vehicle = %report.vehicle_id,
        valid = report.valid,
        "Permit validity checked"
    );

    Ok(Json(report))
}
