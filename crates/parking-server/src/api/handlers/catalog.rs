//! Permit Catalog Handlers

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use parking_auth::Session;
use parking_core::{NewPermitType, PermitType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListPermitTypesResponse {
    pub permit_types: Vec<PermitType>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price_cents: i64,
}

/// GET /v1/permit-types
pub async fn list_permit_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListPermitTypesResponse>, ApiError> {
    let permit_types = state.catalog.list().await?;
    Ok(Json(ListPermitTypesResponse {
        count: permit_types.len(),
        permit_types,
    }))
}

/// POST /v1/admin/permit-types
pub async fn create_permit_type(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    request: Result<Json<NewPermitType>, JsonRejection>,
) -> Result<(StatusCode, Json<PermitType>), ApiError> {
    let Json(request) = request?;
    let permit_type = state.catalog.create(&admin, request).await?;
    Ok((StatusCode::CREATED, Json(permit_type)))
}

/// PATCH /v1/admin/permit-types/{id}
pub async fn update_permit_type(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<UpdatePriceRequest>, JsonRejection>,
) -> Result<Json<PermitType>, ApiError> {
    let Path(id) = id?;
    let Json(request) = request?;
    let permit_type = state.catalog.update_price(&admin, id, request.price_cents).await?;
    Ok(Json(permit_type))
}

/// DELETE /v1/admin/permit-types/{id}
pub async fn delete_permit_type(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.catalog.delete(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
