//! # Accepted Signing Algorithms
//!
//! The validator never trusts the token header to choose a verification
//! method. The header's `alg` is mapped onto this closed enum once; a miss
//! is an immediate [`CredentialError::InvalidSignature`](crate::CredentialError).

use jsonwebtoken::Algorithm;

/// Signing algorithms the service issues and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptedAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    Es256,
}

impl AcceptedAlgorithm {
    /// The algorithm used for newly issued credentials.
    pub const ISSUING: Self = Self::Es256;

    /// Map a header algorithm onto the accepted set.
    pub fn from_header(alg: Algorithm) -> Option<Self> {
        match alg {
            Algorithm::ES256 => Some(Self::Es256),
            _ => None,
        }
    }

    /// The `jsonwebtoken` algorithm this variant corresponds to.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Es256 => Algorithm::ES256,
        }
    }
}
