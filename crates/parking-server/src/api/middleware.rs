//! Request gating
//!
//! Each protected route group is wrapped in exactly one of these layers. The
//! handler behind it receives the resolved identity as a request extension.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use parking_auth::{bearer_token, GatewayScope};
use parking_core::Role;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::clients::SERVICE_KEY_HEADER;
use crate::state::AppState;

/// Header carrying a gateway API key
pub const API_KEY_HEADER: &str = "x-api-key";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Require a bearer session for `role`
///
/// ```ignore
/// Router::new()
///     .route("/v1/driver/me", get(me))
///     .route_layer(from_fn_with_state((state.clone(), Role::Driver), require_role))
/// ```
pub async fn require_role(
    State((state, role)): State<(Arc<AppState>, Role)>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = header(request.headers(), AUTHORIZATION.as_str()).and_then(bearer_token);
    let session = state.authenticator.authenticate(token, role).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Require a gateway API key scoped to `scope`
pub async fn require_scope(
    State((state, scope)): State<(Arc<AppState>, GatewayScope)>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = header(request.headers(), API_KEY_HEADER);
    let info = state.gateway.authorize(presented, scope).await?;
    request.extensions_mut().insert(info);
    Ok(next.run(request).await)
}

/// Require the shared service key on internal registry routes
pub async fn require_service_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .service_key
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("FORBIDDEN", "internal routes disabled".into()))?;

    match header(request.headers(), SERVICE_KEY_HEADER) {
        Some(presented) if constant_time_eq(presented.as_bytes(), expected.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => Err(ApiError::Forbidden("FORBIDDEN", "invalid service key".into())),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
