//! One place where an [`AuthzError`] becomes an HTTP response.
//!
//! Response shapes follow the external contract exactly: handlers and
//! middleware never match on `AuthzError` variants themselves, they just
//! `?`-propagate and let this `IntoResponse` impl pick the status and body.

use authz_core::error::AuthzError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub struct ApiError(pub AuthzError);

impl From<AuthzError> for ApiError {
    fn from(inner: AuthzError) -> Self {
        Self(inner)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AuthzError::SessionInvalid { reason } => {
                (StatusCode::UNAUTHORIZED, Json(ErrorBody { error: reason })).into_response()
            }
            AuthzError::DeviceMismatch => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "Device mismatch".to_string(),
                }),
            )
                .into_response(),
            AuthzError::SessionTerminated { .. } => (
                StatusCode::FORBIDDEN,
                Json(MessageBody {
                    message: "Session terminated".to_string(),
                }),
            )
                .into_response(),
            AuthzError::PolicyDenied { .. } => (
                StatusCode::FORBIDDEN,
                Json(ErrorBody {
                    error: "Forbidden".to_string(),
                }),
            )
                .into_response(),
            AuthzError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    error: "Too many requests, try again later".to_string(),
                }),
            )
                .into_response(),
            AuthzError::StoreUnavailable(_)
            | AuthzError::PolicyUnavailable(_)
            | AuthzError::AuditDegraded(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: "Service temporarily unavailable".to_string(),
                }),
            )
                .into_response(),
            AuthzError::MalformedInput(reason) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: reason })).into_response()
            }
            AuthzError::PayloadTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody {
                    error: "Payload too large".to_string(),
                }),
            )
                .into_response(),
            AuthzError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: "Request cancelled".to_string(),
                }),
            )
                .into_response(),
            AuthzError::Internal(reason) => {
                tracing::error!(error = %reason, "internal error reached the API boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
