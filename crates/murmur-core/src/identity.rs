//! # Identity Newtypes
//!
//! Anonymous callers are identified by an [`IdentityId`] that is bound to
//! the [`NetworkOrigin`] they first contacted the service from. At most one
//! [`Identity`] exists per origin; the persistence layer enforces that with
//! an atomic upsert.

use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// IdentityId
// ---------------------------------------------------------------------------

/// A unique identifier for an anonymous caller.
///
/// Serialized as the bare hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Create a new random identity identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an identity identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidIdentityId(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// NetworkOrigin
// ---------------------------------------------------------------------------

/// The network origin (IP address) a caller contacted the service from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkOrigin(IpAddr);

impl NetworkOrigin {
    /// Wrap a resolved IP address.
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// The underlying IP address.
    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for NetworkOrigin {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl std::fmt::Display for NetworkOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetworkOrigin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidOrigin(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An anonymous caller record.
///
/// Created on first contact from an origin and looked up (never re-created)
/// on every later contact from the same origin. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier, carried as the credential subject.
    pub id: IdentityId,
    /// The origin the identity is registered to.
    pub origin: NetworkOrigin,
    /// When the identity was first created.
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// A fresh identity for `origin`, created now.
    pub fn new(origin: NetworkOrigin) -> Self {
        Self {
            id: IdentityId::new(),
            origin,
            created_at: Utc::now(),
        }
    }
}
