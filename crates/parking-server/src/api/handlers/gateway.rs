//! Gateway Handlers
//!
//! Read-only views for external agencies, authenticated by API key rather
//! than a session. The police scope sees permit validity by plate; the
//! registrar scope sees whether an account carries unpaid tickets.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Extension, Json,
};
use parking_auth::ApiKeyInfo;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::vehicles::PlateQuery;
use crate::api::error::ApiError;
use crate::engine::{UnpaidSummary, ValidityReport};
use crate::state::AppState;

/// GET /v1/gateway/validity?plate=&state=
pub async fn gateway_validity(
    State(state): State<Arc<AppState>>,
    Extension(key): Extension<ApiKeyInfo>,
    query: Result<Query<PlateQuery>, QueryRejection>,
) -> Result<Json<ValidityReport>, ApiError> {
    let Query(query) = query?;
    let report = state.validity.check_plate(&query.plate, &query.state).await?;
    info!(key_id = %key.key_id, owner = %key.owner, "Gateway validity lookup");
    Ok(Json(report))
}

/// GET /v1/gateway/accounts/{driver_id}/unpaid
pub async fn gateway_unpaid(
    State(state): State<Arc<AppState>>,
    Extension(key): Extension<ApiKeyInfo>,
    driver_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UnpaidSummary>, ApiError> {
    let Path(driver_id) = driver_id?;
    let summary = state.tickets.unpaid_summary(driver_id).await?;
    info!(key_id = %key.key_id, owner = %key.owner, "Gateway unpaid lookup");
    Ok(Json(summary))
}
