//! Account Handlers
//!
//! Signup, login, profile and admin management of principals.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use parking_auth::Session;
use parking_core::{Principal, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::engine::NewAccount;
use crate::state::AppState;

/// Password login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued session token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListPrincipalsResponse {
    pub principals: Vec<Principal>,
    pub count: usize,
}

/// Driver self-signup
///
/// POST /v1/drivers
pub async fn signup(
    State(state): State<Arc<AppState>>,
    request: Result<Json<NewAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let Json(request) = request?;
    let principal = state.accounts.signup_driver(request).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}

/// Log in against the table for `role`
///
/// POST /v1/sessions/{role}
pub async fn login(
    State(state): State<Arc<AppState>>,
    role: Result<Path<Role>, PathRejection>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Path(role) = role?;
    let Json(request) = request?;
    let issued = state
        .accounts
        .login(role, &request.email, &request.password)
        .await?;

    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.expires_at,
    }))
}

/// GET /v1/driver/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Principal>, ApiError> {
    Ok(Json(state.accounts.me(&session).await?))
}

/// POST /v1/admin/enforcers
pub async fn provision_enforcer(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    request: Result<Json<NewAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let Json(request) = request?;
    let principal = state.accounts.provision(&admin, Role::Enforcer, request).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}

/// POST /v1/admin/admins
pub async fn provision_admin(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    request: Result<Json<NewAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let Json(request) = request?;
    let principal = state.accounts.provision(&admin, Role::Admin, request).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}

/// GET /v1/admin/enforcers
pub async fn list_enforcers(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
) -> Result<Json<ListPrincipalsResponse>, ApiError> {
    let principals = state.accounts.list_enforcers(&admin).await?;
    Ok(Json(ListPrincipalsResponse {
        count: principals.len(),
        principals,
    }))
}

/// Hard-delete an enforcer
///
/// DELETE /v1/admin/enforcers/{id}
pub async fn delete_enforcer(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    enforcer_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(enforcer_id) = enforcer_id?;
    state.accounts.delete_enforcer(&admin, enforcer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/admin/principals/{role}/{id}/deactivate
pub async fn deactivate_principal(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Session>,
    params: Result<Path<(Role, Uuid)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((role, id)) = params?;
    state.accounts.deactivate(&admin, role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
