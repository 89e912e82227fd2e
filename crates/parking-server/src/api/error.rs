//! API error types and responses

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parking_auth::AuthError;
use parking_core::ParkingError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::engine::EngineError;
use crate::storage::StorageError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Unauthenticated(AuthError),

    #[error("Forbidden: {1}")]
    Forbidden(&'static str, String),

    #[error("Not found: {1}")]
    NotFound(&'static str, String),

    #[error("Conflict: {1}")]
    Conflict(&'static str, String),

    #[error("Validation failed: {1}")]
    Validation(&'static str, String, Option<serde_json::Value>),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Unauthenticated(err) => {
                let code = match &err {
                    AuthError::MissingToken => "MISSING_TOKEN",
                    AuthError::Expired => "TOKEN_EXPIRED",
                    AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                    AuthError::MissingApiKey => "MISSING_API_KEY",
                    AuthError::ApiKeyNotFound | AuthError::ApiKeyExpired(_) => {
                        "INVALID_API_KEY"
                    }
                    _ => "INVALID_SIGNATURE",
                };
                (StatusCode::UNAUTHORIZED, code, err.to_string(), None)
            }
            ApiError::Forbidden(code, msg) => (StatusCode::FORBIDDEN, code, msg, None),
            ApiError::NotFound(code, msg) => (StatusCode::NOT_FOUND, code, msg, None),
            ApiError::Conflict(code, msg) => (StatusCode::CONFLICT, code, msg, None),
            ApiError::Validation(code, msg, details) => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, msg, details)
            }
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED", msg, None),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg, None)
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized { .. } | AuthError::ScopeDenied { .. } => {
                ApiError::Forbidden("FORBIDDEN", err.to_string())
            }
            AuthError::WeakPassword(reason) => ApiError::Validation(
                "VALIDATION_FAILED",
                format!("password {}", reason),
                Some(serde_json::json!({ "field": "password" })),
            ),
            AuthError::Configuration(msg) | AuthError::Store(msg) | AuthError::PasswordHash(msg) => {
                ApiError::Internal(msg)
            }
            other => ApiError::Unauthenticated(other),
        }
    }
}

impl From<ParkingError> for ApiError {
    fn from(err: ParkingError) -> Self {
        EngineError::from(err).into()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Malformed request input, rendered in the same envelope as domain validation
fn rejected(source: &'static str, message: String) -> ApiError {
    ApiError::Validation(
        "VALIDATION_FAILED",
        message,
        Some(serde_json::json!({ "source": source })),
    )
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        rejected("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", rejection.body_text())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Auth(auth) => auth.into(),
            EngineError::VehicleNotFound => ApiError::NotFound("VEHICLE_NOT_FOUND", message),
            EngineError::TicketNotFound => ApiError::NotFound("TICKET_NOT_FOUND", message),
            EngineError::PermitTypeNotFound => ApiError::NotFound("PERMIT_TYPE_NOT_FOUND", message),
            EngineError::PermitNotFound => ApiError::NotFound("PERMIT_NOT_FOUND", message),
            EngineError::PrincipalNotFound(_) => ApiError::NotFound("PRINCIPAL_NOT_FOUND", message),
            EngineError::VehicleNotConfirmed => ApiError::Forbidden("VEHICLE_NOT_CONFIRMED", message),
            EngineError::OverlappingPermit => ApiError::Conflict("OVERLAPPING_PERMIT", message),
            EngineError::DuplicateVehicle => ApiError::Conflict("DUPLICATE_VEHICLE", message),
            EngineError::DuplicateAccount => ApiError::Conflict("DUPLICATE_ACCOUNT", message),
            EngineError::InvalidTransition { action, from } => ApiError::Conflict(
                "INVALID_TRANSITION",
                format!("Cannot {} a ticket that is {}", action, from),
            ),
            EngineError::UnsupportedDurationClass(class) => ApiError::Validation(
                "UNSUPPORTED_DURATION_CLASS",
                message,
                Some(serde_json::json!({ "duration_class": class })),
            ),
            EngineError::Validation(ParkingError::Validation { field, reason }) => ApiError::Validation(
                "VALIDATION_FAILED",
                format!("{}: {}", field, reason),
                Some(serde_json::json!({ "field": field })),
            ),
            EngineError::Validation(other) => ApiError::Validation("VALIDATION_FAILED", other.to_string(), None),
            EngineError::AmountOverflow(_) => ApiError::Internal(message),
            EngineError::Upstream(msg) => ApiError::Upstream(msg),
            EngineError::Storage(storage) => storage.into(),
        }
    }
}
