//! Vehicle Handlers

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use parking_auth::Session;
use parking_core::{NewVehicle, Permit, Vehicle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;

/// `?plate=&state=` query shared by enforcer and gateway lookups
#[derive(Debug, Deserialize)]
pub struct PlateQuery {
    pub plate: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct ListVehiclesResponse {
    pub vehicles: Vec<Vehicle>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListPermitsResponse {
    pub permits: Vec<Permit>,
    pub count: usize,
}

impl From<Vec<Permit>> for ListPermitsResponse {
    fn from(permits: Vec<Permit>) -> Self {
        Self {
            count: permits.len(),
            permits,
        }
    }
}

/// POST /v1/driver/vehicles
pub async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    request: Result<Json<NewVehicle>, JsonRejection>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let Json(request) = request?;
    let vehicle = state.registry.register(&driver, request).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /v1/driver/vehicles
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
) -> Result<Json<ListVehiclesResponse>, ApiError> {
    let vehicles = state.registry.list_own(&driver).await?;
    Ok(Json(ListVehiclesResponse {
        count: vehicles.len(),
        vehicles,
    }))
}

/// Soft-delete one of the caller's vehicles
///
/// DELETE /v1/driver/vehicles/{id}
pub async fn remove_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    vehicle_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(vehicle_id) = vehicle_id?;
    state.registry.remove(&driver, vehicle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/driver/vehicles/{id}/permits
pub async fn vehicle_permits(
    State(state): State<Arc<AppState>>,
    Extension(driver): Extension<Session>,
    vehicle_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ListPermitsResponse>, ApiError> {
    let Path(vehicle_id) = vehicle_id?;
    let permits = state.permits.list_for_vehicle(&driver, vehicle_id).await?;
    Ok(Json(permits.into()))
}

/// GET /v1/enforcer/vehicles?plate=&state=
pub async fn lookup_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(enforcer): Extension<Session>,
    query: Result<Query<PlateQuery>, QueryRejection>,
) -> Result<Json<Vehicle>, ApiError> {
    let Query(query) = query?;
    let vehicle = state
        .registry
        .lookup(&enforcer, &query.plate, &query.state)
        .await?;
    Ok(Json(vehicle))
}
