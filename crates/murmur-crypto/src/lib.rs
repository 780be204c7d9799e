//! # murmur-crypto: Credential Primitives for the murmur Feed Service
//!
//! Anonymous callers receive a compact signed bearer token binding their
//! [`IdentityId`](murmur_core::IdentityId) to the origin they were issued
//! from. This crate owns everything about that token:
//!
//! - [`SigningKeyPair`]: the P-256 key pair, generated once at startup and
//!   held for the process lifetime. There is no rotation and no persistence:
//!   a restart invalidates every outstanding credential.
//! - [`TokenIssuer`]: signs `{exp, sub, origin}` claims with ES256.
//! - [`TokenValidator`]: verifies signature, algorithm, expiry, and subject,
//!   in that order, reporting a distinct [`CredentialError`] for each step.
//! - [`AcceptedAlgorithm`]: the closed set of algorithms the validator will
//!   consider. Anything else, `none` included, is rejected before signature
//!   verification.

pub mod algorithm;
pub mod error;
pub mod keys;
pub mod token;

// Re-export primary types.
pub use algorithm::AcceptedAlgorithm;
pub use error::{CredentialError, CryptoError};
pub use keys::SigningKeyPair;
pub use token::{Claims, IssuedToken, TokenIssuer, TokenValidator, VerifiedCredential};

/// Validity window of an issued credential, in hours.
pub const CREDENTIAL_VALIDITY_HOURS: i64 = 48;
