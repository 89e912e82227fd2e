//! Internal Registry Handlers
//!
//! The server side of [`crate::clients::HttpRegistryClient`]. Mounted only
//! when a service key is configured.

use axum::{
    extract::rejection::PathRejection,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use parking_core::{Contact, Vehicle, VehicleKey};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::clients::{UpstreamError, OWNER_HEADER, PLATE_HEADER, STATE_HEADER};
use crate::state::AppState;

fn required_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Validation(
                "VALIDATION_FAILED",
                format!("missing header {}", name),
                Some(serde_json::json!({ "header": name })),
            )
        })
}

fn upstream(err: UpstreamError) -> ApiError {
    ApiError::Upstream(err.0)
}

/// GET /internal/v1/vehicles/ownership
///
/// Reads `X-Plate`, `X-State` and `X-Owner-Id`. Answers 404 unless the plate
/// resolves to a live vehicle owned by that driver.
pub async fn confirm_ownership(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vehicle>, ApiError> {
    let key = VehicleKey::parse(
        required_header(&headers, PLATE_HEADER)?,
        required_header(&headers, STATE_HEADER)?,
    )?;
    let owner_id = required_header(&headers, OWNER_HEADER)?
        .parse::<Uuid>()
        .map_err(|_| {
            ApiError::Validation(
                "VALIDATION_FAILED",
                "owner id must be a UUID".into(),
                Some(serde_json::json!({ "header": OWNER_HEADER })),
            )
        })?;

    state
        .registry
        .confirm_ownership(&key, owner_id)
        .await
        .map_err(upstream)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("VEHICLE_NOT_FOUND", "no such vehicle for owner".into()))
}

/// GET /internal/v1/vehicles/{id}/owner-contact
pub async fn owner_contact(
    State(state): State<Arc<AppState>>,
    vehicle_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Path(vehicle_id) = vehicle_id?;
    state
        .registry
        .owner_contact(vehicle_id)
        .await
        .map_err(upstream)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("VEHICLE_NOT_FOUND", "vehicle not found".into()))
}
