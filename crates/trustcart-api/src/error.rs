//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps escrow domain errors to HTTP status codes with JSON error
//! bodies. Internal error details are never exposed to clients.
//!
//! Note that guard failures on the process-action endpoint do NOT flow
//! through this type: the route renders them as `200 {success: false}`
//! business outcomes (see [`crate::routes::escrow`]). `AppError` covers
//! request-shape failures, lookups, and the administrative surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use trustcart_escrow::EscrowError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Actor lacks the required role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Map escrow domain errors to API errors.
///
/// State guards map to 409 Conflict (the resource exists but rejects
/// the mutation), authorization guards to 403, lookups to 404.
impl From<EscrowError> for AppError {
    fn from(err: EscrowError) -> Self {
        match &err {
            EscrowError::Validation(_) => Self::Validation(err.to_string()),
            EscrowError::ProductNotFound { .. } | EscrowError::LedgerNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            EscrowError::LedgerClosed { .. }
            | EscrowError::IllegalTransition { .. }
            | EscrowError::LedgerLocked { .. }
            | EscrowError::StoreConflict { .. } => Self::Conflict(err.to_string()),
            EscrowError::Unauthorized { .. } => Self::Forbidden(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use trustcart_escrow::Status;

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing ledger".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_status_code() {
        let err = AppError::Validation("bad field".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn escrow_lookup_errors_map_to_not_found() {
        let err = AppError::from(EscrowError::LedgerNotFound {
            ledger_id: "abc".to_string(),
        });
        assert!(matches!(err, AppError::NotFound(_)));

        let err = AppError::from(EscrowError::ProductNotFound {
            product_id: "p".to_string(),
        });
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn escrow_guard_errors_map_to_conflict() {
        let err = AppError::from(EscrowError::IllegalTransition {
            from: Status::PendingPayment,
            to: Status::Released,
        });
        assert!(matches!(err, AppError::Conflict(_)));

        let err = AppError::from(EscrowError::LedgerClosed {
            ledger_id: "abc".to_string(),
            status: Status::Cancelled,
        });
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn unauthorized_maps_to_forbidden() {
        let err = AppError::from(EscrowError::Unauthorized {
            reason: "nope".to_string(),
        });
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_not_found() {
        let (status, body) = response_parts(AppError::NotFound("ledger 123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("ledger 123"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("store exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(
            !body.error.message.contains("store exploded"),
            "internal error details must not leak: {}",
            body.error.message
        );
    }
}
