//! # Request Context
//!
//! Every request gets a [`RequestContext`] from the pipeline middleware:
//! a request id, a deadline, and (once the auth middleware has run) the
//! caller's identity. Handlers pull it with the `FromRequestParts`
//! extractors below instead of looking values up by string key.

use std::sync::Arc;
use std::time::Duration;

use axum::http::request::Parts;
use murmur_core::IdentityId;
use murmur_crypto::CredentialError;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier of a single request, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Generate a new random request id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Get as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request state owned by a single request's handling.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id, also sent back as `X-Request-ID`.
    pub request_id: RequestId,
    /// Instant after which the request is abandoned.
    pub deadline: Instant,
    /// Authorized caller; `None` until the auth middleware accepts a credential.
    pub identity: Option<IdentityId>,
}

impl RequestContext {
    /// Context for a request that must complete within `timeout`.
    pub fn new(request_id: RequestId, timeout: Duration) -> Self {
        Self {
            request_id,
            deadline: Instant::now() + timeout,
            identity: None,
        }
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Cancellation check for handlers to call between data-access steps.
    pub fn ensure_active(&self) -> Result<(), AppError> {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Err(AppError::Internal("request deadline exceeded".into()));
        }
        tracing::debug!(
            request_id = %self.request_id,
            remaining_ms = remaining.as_millis() as u64,
            "deadline check passed"
        );
        Ok(())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("request context not established".into()))
    }
}

/// The authorized caller of a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub IdentityId);

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.identity)
            .map(Caller)
            .ok_or(AppError::Unauthorized(CredentialError::Missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn request_id_is_a_uuid() {
        let id = RequestId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[tokio::test]
    async fn fresh_context_is_active() {
        let ctx = RequestContext::new(RequestId::new(), Duration::from_secs(8));
        assert!(ctx.ensure_active().is_ok());
        assert!(ctx.remaining() > Duration::ZERO);
        assert!(ctx.remaining() <= Duration::from_secs(8));
        assert!(ctx.identity.is_none());
    }

    #[tokio::test]
    async fn zero_timeout_context_is_expired() {
        let ctx = RequestContext::new(RequestId::new(), Duration::ZERO);
        assert_eq!(ctx.remaining(), Duration::ZERO);
        assert!(matches!(ctx.ensure_active(), Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn caller_requires_an_identity() {
        let ctx = RequestContext::new(RequestId::new(), Duration::from_secs(8));
        let mut request = Request::builder().body(()).unwrap();
        request.extensions_mut().insert(ctx);
        let (mut parts, _) = request.into_parts();

        let result = Caller::from_request_parts(&mut parts, &()).await;
        assert!(matches!(
            result,
            Err(AppError::Unauthorized(CredentialError::Missing))
        ));
    }

    #[tokio::test]
    async fn caller_reads_the_authorized_identity() {
        let id = IdentityId::new();
        let mut ctx = RequestContext::new(RequestId::new(), Duration::from_secs(8));
        ctx.identity = Some(id);
        let mut request = Request::builder().body(()).unwrap();
        request.extensions_mut().insert(ctx);
        let (mut parts, _) = request.into_parts();

        let caller = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller, Caller(id));
    }

    #[tokio::test]
    async fn missing_context_is_an_internal_error() {
        let request = Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let result = RequestContext::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
