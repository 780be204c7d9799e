//! Network origin resolution.
//!
//! The caller's origin is the socket peer address recorded by
//! `into_make_service_with_connect_info`. Behind a reverse proxy the peer
//! is the proxy itself, so a deployment may name one header (for example
//! `X-Real-Ip`) that the proxy sets and that is trusted in its place.
//! Once a header is trusted the peer is never used: a request without a
//! single parseable address in that header has no origin.
//! Client-supplied headers are never consulted otherwise.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, Request};
use murmur_core::NetworkOrigin;
use thiserror::Error;

use crate::error::AppError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OriginError {
    /// The trusted header (or, without one, the connection) yielded no address.
    #[error("no network origin could be determined")]
    NoOrigin,
}

impl From<OriginError> for AppError {
    fn from(err: OriginError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Resolves the [`NetworkOrigin`] of a request.
#[derive(Debug, Clone, Default)]
pub struct OriginResolver {
    trusted_header: Option<HeaderName>,
}

impl OriginResolver {
    /// Resolver that uses the socket peer address only.
    pub fn peer_only() -> Self {
        Self::default()
    }

    /// Resolver that takes the origin from `header` alone.
    pub fn with_trusted_header(header: HeaderName) -> Self {
        Self {
            trusted_header: Some(header),
        }
    }

    pub fn resolve<B>(&self, req: &Request<B>) -> Result<NetworkOrigin, OriginError> {
        let ip = match &self.trusted_header {
            Some(header) => Self::from_header(req, header),
            None => req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        };
        ip.map(NetworkOrigin::new).ok_or(OriginError::NoOrigin)
    }

    /// The whole header value as one address. Lists are not split.
    fn from_header<B>(req: &Request<B>, header: &HeaderName) -> Option<IpAddr> {
        req.headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    }
}
