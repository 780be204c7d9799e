//! # API Error Types
//!
//! [`AppError`] is the single failure type handlers, extractors, and
//! middleware return. Its `IntoResponse` writes the wire envelope
//!
//! ```json
//! { "error": "<client message>" }
//! ```
//!
//! and stashes a [`FailureReport`] (status, client message, internal cause)
//! in the response extensions. The request pipeline passes every response
//! through [`ErrorResponder::finish`], which removes the report and emits
//! exactly one log line correlated with the request id. The internal cause
//! never reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use murmur_core::ValidationError;
use murmur_crypto::CredentialError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::context::RequestId;
use crate::db::StoreError;

/// Wire envelope for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Client-facing message.
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed client input (400). The message is shown to the client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or refused credential (401).
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] CredentialError),

    /// Caller does not own the resource being mutated (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No matching route or resource (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Signing, origin resolution, or data-access failure (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message written into the envelope.
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Unauthorized(CredentialError::Missing) => "No token provided".to_string(),
            Self::Unauthorized(_) => "Invalid token".to_string(),
            Self::Forbidden(_) => "Forbidden".to_string(),
            Self::NotFound(_) => "Resource not found".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Convert domain validation failures to 400s.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Convert data-access failures: missing rows are 404, everything else 500.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Failure details carried from `into_response` to the pipeline's logger.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub status: StatusCode,
    pub message: String,
    pub cause: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.client_message();
        let report = FailureReport {
            status,
            message: message.clone(),
            cause: self.to_string(),
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Uniform translation of failures into logged error responses.
pub struct ErrorResponder;

impl ErrorResponder {
    /// Render `error` for the request `request_id` and log it.
    pub fn respond(request_id: &RequestId, error: AppError) -> Response {
        Self::finish(request_id, error.into_response())
    }

    /// Log the failure carried by `response`, if any, and strip the report.
    ///
    /// Responses without a report (successes) pass through untouched.
    pub fn finish(request_id: &RequestId, mut response: Response) -> Response {
        if let Some(report) = response.extensions_mut().remove::<FailureReport>() {
            if report.status.is_server_error() {
                tracing::error!(
                    request_id = %request_id,
                    status = report.status.as_u16(),
                    message = %report.message,
                    cause = %report.cause,
                    "request failed"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    status = report.status.as_u16(),
                    message = %report.message,
                    cause = %report.cause,
                    "request failed"
                );
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized(CredentialError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn bad_request_shows_its_message() {
        let (status, body) =
            response_parts(AppError::BadRequest("'offset' is not a number".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "'offset' is not a number");
    }

    #[tokio::test]
    async fn missing_credential_message() {
        let (status, body) = response_parts(AppError::Unauthorized(CredentialError::Missing)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "No token provided");
    }

    #[tokio::test]
    async fn refused_credential_hides_the_reason() {
        for reason in [
            CredentialError::InvalidSignature,
            CredentialError::Expired,
            CredentialError::MalformedClaims,
        ] {
            let (status, body) = response_parts(AppError::Unauthorized(reason)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body.error, "Invalid token");
        }
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("pool timed out after 5s".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[tokio::test]
    async fn forbidden_and_not_found_use_fixed_messages() {
        let (_, body) = response_parts(AppError::Forbidden("post 4 owned by someone".into())).await;
        assert_eq!(body.error, "Forbidden");
        let (_, body) = response_parts(AppError::NotFound("/nope".into())).await;
        assert_eq!(body.error, "Resource not found");
    }

    #[tokio::test]
    async fn envelope_has_a_single_field() {
        let response = AppError::BadRequest("x".into()).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "x" }));
    }

    #[test]
    fn report_carries_the_internal_cause() {
        let response = AppError::Internal("db down".into()).into_response();
        let report = response.extensions().get::<FailureReport>().unwrap();
        assert_eq!(report.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(report.message, "Internal server error");
        assert!(report.cause.contains("db down"));
    }

    #[test]
    fn finish_strips_the_report() {
        let id = RequestId::new();
        let response = ErrorResponder::respond(&id, AppError::Forbidden("nope".into()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<FailureReport>().is_none());
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = AppError::from(StoreError::NotFound("post 9".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_backend_failure_maps_to_500() {
        let err = AppError::from(StoreError::Corrupt("bad origin column".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let err = AppError::from(ValidationError::NotANumber { field: "postId" });
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "'postId' is not a number"),
            other => panic!("expected BadRequest, got: {other:?}"),
        }
    }
}
