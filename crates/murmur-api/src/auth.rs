//! # Credential Issuance and Authorization Middleware
//!
//! `POST /auth` goes through [`AuthIssuer`]: the caller's origin is upserted
//! into an identity and a fresh ES256 credential is signed for it. Issuing
//! twice from one origin yields two different credentials for the same
//! identity.
//!
//! Every other feed route sits behind [`auth_middleware`], which reads the
//! `Authorization` header (bare token or `Bearer <token>`), validates it,
//! and records the identity in the request's [`RequestContext`]. A refused
//! credential short-circuits with a 401; the handler is never invoked.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use murmur_core::{IdentityId, NetworkOrigin};
use murmur_crypto::{CredentialError, TokenIssuer};

use crate::context::RequestContext;
use crate::db::FeedStore;
use crate::error::AppError;
use crate::state::AppState;

/// A newly issued credential and the identity it names.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub identity: IdentityId,
}

/// Looks up or creates the identity for an origin and signs a credential for it.
#[derive(Clone)]
pub struct AuthIssuer {
    store: Arc<dyn FeedStore>,
    tokens: TokenIssuer,
}

impl AuthIssuer {
    pub fn new(store: Arc<dyn FeedStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub async fn issue(&self, origin: NetworkOrigin) -> Result<IssuedCredential, AppError> {
        let identity = self
            .store
            .upsert_identity(origin)
            .await
            .map_err(|e| AppError::Internal(format!("identity upsert failed: {e}")))?;

        let issued = self
            .tokens
            .issue(&identity.id, &identity.origin)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(identity = %identity.id, origin = %identity.origin, "credential issued");

        Ok(IssuedCredential {
            token: issued.token,
            identity: identity.id,
        })
    }
}

impl std::fmt::Debug for AuthIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthIssuer")
            .field("validity", &self.tokens.validity())
            .finish_non_exhaustive()
    }
}

/// The credential presented in `Authorization`, without any `Bearer ` prefix.
///
/// An absent header and an empty value both come back as `""`, which the
/// validator rejects as a missing credential.
pub fn presented_credential(headers: &HeaderMap) -> Result<&str, CredentialError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok("");
    };
    let value = value
        .to_str()
        .map_err(|_| CredentialError::MalformedClaims)?
        .trim();
    match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => Ok(rest.trim()),
        _ => Ok(value),
    }
}

/// Axum middleware that authorizes the caller of a protected route.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = presented_credential(request.headers())?;
    let verified = state.validator.validate(credential)?;

    let ctx = request
        .extensions_mut()
        .get_mut::<RequestContext>()
        .ok_or_else(|| AppError::Internal("request context not established".into()))?;
    ctx.identity = Some(verified.identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use axum::http::HeaderValue;
    use murmur_crypto::{SigningKeyPair, TokenValidator};

    fn issuer() -> (AuthIssuer, TokenValidator) {
        let keys = Arc::new(SigningKeyPair::generate().unwrap());
        let store: Arc<dyn FeedStore> = Arc::new(MemoryStore::new());
        (
            AuthIssuer::new(store, TokenIssuer::new(keys.clone())),
            TokenValidator::new(keys),
        )
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    // ── Issuance ────────────────────────────────────────────────────

    #[tokio::test]
    async fn issued_credential_validates_to_its_identity() {
        let (issuer, validator) = issuer();
        let issued = issuer.issue("10.1.1.1".parse().unwrap()).await.unwrap();
        let verified = validator.validate(&issued.token).unwrap();
        assert_eq!(verified.identity, issued.identity);
        assert_eq!(verified.origin.map(|o| o.to_string()).as_deref(), Some("10.1.1.1"));
    }

    #[tokio::test]
    async fn same_origin_same_identity_new_token() {
        let (issuer, _) = issuer();
        let origin: NetworkOrigin = "10.1.1.1".parse().unwrap();
        let first = issuer.issue(origin).await.unwrap();
        let second = issuer.issue(origin).await.unwrap();
        assert_eq!(first.identity, second.identity);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn different_origins_get_different_identities() {
        let (issuer, _) = issuer();
        let a = issuer.issue("10.1.1.1".parse().unwrap()).await.unwrap();
        let b = issuer.issue("10.1.1.2".parse().unwrap()).await.unwrap();
        assert_ne!(a.identity, b.identity);
    }

    // ── Header parsing ──────────────────────────────────────────────

    #[test]
    fn absent_header_is_empty() {
        assert_eq!(presented_credential(&HeaderMap::new()), Ok(""));
    }

    #[test]
    fn bare_token_is_accepted() {
        assert_eq!(presented_credential(&headers("abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(
            presented_credential(&headers("Bearer abc.def.ghi")),
            Ok("abc.def.ghi")
        );
    }

    #[test]
    fn bearer_alone_is_empty() {
        assert_eq!(presented_credential(&headers("Bearer ")), Ok(""));
    }

    #[test]
    fn non_ascii_header_is_refused() {
        let mut map = HeaderMap::new();
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"tok\xe9n").unwrap(),
        );
        assert_eq!(
            presented_credential(&map),
            Err(CredentialError::MalformedClaims)
        );
    }
}
