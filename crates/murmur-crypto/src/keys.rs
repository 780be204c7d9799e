//! # Process-Lifetime Signing Key
//!
//! A single P-256 key pair is generated at startup and shared (behind an
//! `Arc`) by the issuer and validator. The private half never leaves this
//! struct and the PKCS#8 document is zeroized once the encoding key has
//! been built.

use jsonwebtoken::{DecodingKey, EncodingKey};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// ES256 key pair held for the process lifetime.
///
/// Custom `Debug` redacts key material.
pub struct SigningKeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeyPair {
    /// Generate a fresh P-256 key pair from the system RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let rng = SystemRandom::new();
        let document = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .map_err(|_| CryptoError::KeyGeneration("system RNG unavailable".into()))?;
        let pkcs8 = Zeroizing::new(document.as_ref().to_vec());
        Self::from_pkcs8_der(&pkcs8)
    }

    /// Load a key pair from a PKCS#8 DER document.
    pub fn from_pkcs8_der(pkcs8: &[u8]) -> Result<Self, CryptoError> {
        let rng = SystemRandom::new();
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        // ring verifies against the uncompressed SEC1 point.
        let decoding = DecodingKey::from_ec_der(pair.public_key().as_ref());
        let encoding = EncodingKey::from_ec_der(pkcs8);

        Ok(Self { encoding, decoding })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("algorithm", &"ES256")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
