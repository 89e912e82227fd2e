//! API module for the parking server

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Json, Router,
};
use parking_auth::GatewayScope;
use parking_core::Role;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use middleware::{require_role, require_scope, require_service_key};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
///
/// 503 while the store cannot be reached.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true })),
        Err(e) => {
            warn!(error = %e, "Store not ready");
            (StatusCode::SERVICE_UNAVAILABLE, Json(ReadyResponse { ready: false }))
        }
    }
}

fn driver_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/driver/me", get(handlers::me))
        .route(
            "/v1/driver/vehicles",
            post(handlers::register_vehicle).get(handlers::list_vehicles),
        )
        .route(
            "/v1/driver/vehicles/{id}",
            delete(handlers::remove_vehicle),
        )
        .route("/v1/driver/vehicles/{id}/permits", get(handlers::vehicle_permits))
        .route(
            "/v1/driver/permits",
            post(handlers::issue_permit).get(handlers::list_permits),
        )
        .route("/v1/driver/tickets", get(handlers::list_tickets))
        .route("/v1/driver/tickets/{id}/pay", post(handlers::pay_ticket))
        .route("/v1/driver/tickets/{id}/challenge", post(handlers::challenge_ticket))
        .route_layer(from_fn_with_state((state.clone(), Role::Driver), require_role))
}

fn enforcer_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/enforcer/vehicles", get(handlers::lookup_vehicle))
        .route("/v1/enforcer/validity", get(handlers::check_validity))
        .route("/v1/enforcer/tickets", post(handlers::issue_ticket))
        .route_layer(from_fn_with_state((state.clone(), Role::Enforcer), require_role))
}

fn admin_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/v1/admin/enforcers",
            post(handlers::provision_enforcer).get(handlers::list_enforcers),
        )
        .route(
            "/v1/admin/enforcers/{id}",
            delete(handlers::delete_enforcer),
        )
        .route("/v1/admin/admins", post(handlers::provision_admin))
        .route(
            "/v1/admin/principals/{role}/{id}/deactivate",
            post(handlers::deactivate_principal),
        )
        .route("/v1/admin/permit-types", post(handlers::create_permit_type))
        .route(
            "/v1/admin/permit-types/{id}",
            patch(handlers::update_permit_type)
                .delete(handlers::delete_permit_type),
        )
        .route("/v1/admin/permits/{id}", delete(handlers::revoke_permit))
        .route("/v1/admin/challenges", get(handlers::list_challenges))
        .route("/v1/admin/tickets/{id}/accept", post(handlers::accept_challenge))
        .route("/v1/admin/tickets/{id}/reject", post(handlers::reject_challenge))
        .route_layer(from_fn_with_state((state.clone(), Role::Admin), require_role))
}

fn gateway_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let police = Router::new()
        .route("/v1/gateway/validity", get(handlers::gateway_validity))
        .route_layer(from_fn_with_state(
            (state.clone(), GatewayScope::Police),
            require_scope,
        ));

    let registrar = Router::new()
        .route(
            "/v1/gateway/accounts/{driver_id}/unpaid",
            get(handlers::gateway_unpaid),
        )
        .route_layer(from_fn_with_state(
            (state.clone(), GatewayScope::Registrar),
            require_scope,
        ));

    police.merge(registrar)
}

fn internal_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/internal/v1/vehicles/ownership", get(handlers::confirm_ownership))
        .route(
            "/internal/v1/vehicles/{id}/owner-contact",
            get(handlers::owner_contact),
        )
        .route_layer(from_fn_with_state(state.clone(), require_service_key))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for browser-based clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Public endpoints
        .route("/v1/drivers", post(handlers::signup))
        .route("/v1/sessions/{role}", post(handlers::login))
        .route("/v1/permit-types", get(handlers::list_permit_types))
        .merge(driver_routes(&state))
        .merge(enforcer_routes(&state))
        .merge(admin_routes(&state))
        .merge(gateway_routes(&state));

    if state.service_key.is_some() {
        router = router.merge(internal_routes(&state));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
