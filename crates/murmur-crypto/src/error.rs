//! # Cryptographic Error Types
//!
//! [`CryptoError`] covers failures on the issuing side (key generation,
//! signing). [`CredentialError`] is the closed set of reasons a presented
//! credential is refused; its `Display` strings are logged as the internal
//! cause of a 401.

use thiserror::Error;

/// Errors from key generation and token signing.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The system RNG or the key encoder failed while generating the key pair.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Encoding or signing a token failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Why a presented credential was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential, or an empty one, was presented.
    #[error("missing credential")]
    Missing,

    /// Bad signature, undecodable token, or an algorithm outside the accepted set.
    #[error("invalid signature")]
    InvalidSignature,

    /// The `exp` claim is at or before the validation instant.
    #[error("expired")]
    Expired,

    /// `exp` or `sub` absent or not of the expected shape.
    #[error("malformed claims")]
    MalformedClaims,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_error_reasons() {
        assert_eq!(CredentialError::Missing.to_string(), "missing credential");
        assert_eq!(
            CredentialError::InvalidSignature.to_string(),
            "invalid signature"
        );
        assert_eq!(CredentialError::Expired.to_string(), "expired");
        assert_eq!(
            CredentialError::MalformedClaims.to_string(),
            "malformed claims"
        );
    }

    #[test]
    fn crypto_error_display_carries_detail() {
        let err = CryptoError::Signing("bad key".into());
        assert!(err.to_string().contains("bad key"));
    }
}
