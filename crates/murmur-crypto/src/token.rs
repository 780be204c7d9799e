//! # Credential Issuance and Validation
//!
//! ## Token Format
//!
//! Compact JWS, header `{"alg":"ES256","typ":"JWT"}`, claims:
//!
//! ```text
//! { "exp": <unix seconds>, "sub": "<identity uuid>", "origin": "<ip>" }
//! ```
//!
//! ## Validation order
//!
//! 1. empty string → [`CredentialError::Missing`]
//! 2. header algorithm outside [`AcceptedAlgorithm`], undecodable token, or
//!    bad signature → [`CredentialError::InvalidSignature`]
//! 3. `exp` ≤ now → [`CredentialError::Expired`]
//! 4. `exp` or `sub` absent/ill-typed → [`CredentialError::MalformedClaims`]
//!
//! The `origin` claim is carried for audit only. It is never compared with
//! the address of the request presenting the token.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Header, Validation};
use murmur_core::{IdentityId, NetworkOrigin};
use serde::{Deserialize, Serialize};

use crate::algorithm::AcceptedAlgorithm;
use crate::error::{CredentialError, CryptoError};
use crate::keys::SigningKeyPair;
use crate::CREDENTIAL_VALIDITY_HOURS;

/// Claims carried by an issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Identity identifier.
    pub sub: String,
    /// Origin the identity was registered to at issuance.
    pub origin: String,
}

/// Claims as read back from a presented token, before shape checks.
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    exp: Option<serde_json::Value>,
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    origin: Option<serde_json::Value>,
}

/// A freshly signed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact serialized token.
    pub token: String,
    /// When the token stops validating.
    pub expires_at: DateTime<Utc>,
}

/// What a valid credential proves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// The bound identity.
    pub identity: IdentityId,
    /// Origin recorded at issuance, if it parsed. Informational only.
    pub origin: Option<NetworkOrigin>,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

// ── Issuer ──────────────────────────────────────────────────────────────────

/// Signs credentials with the process key.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<SigningKeyPair>,
    validity: Duration,
}

impl TokenIssuer {
    /// Issuer with the standard 48-hour validity window.
    pub fn new(keys: Arc<SigningKeyPair>) -> Self {
        Self::with_validity(keys, Duration::hours(CREDENTIAL_VALIDITY_HOURS))
    }

    /// Issuer with an explicit validity window.
    pub fn with_validity(keys: Arc<SigningKeyPair>, validity: Duration) -> Self {
        Self { keys, validity }
    }

    /// The validity window applied to new credentials.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a credential for `identity` bound to `origin`, valid from now.
    pub fn issue(
        &self,
        identity: &IdentityId,
        origin: &NetworkOrigin,
    ) -> Result<IssuedToken, CryptoError> {
        self.issue_at(identity, origin, Utc::now())
    }

    /// Issue a credential as if the current instant were `now`.
    pub fn issue_at(
        &self,
        identity: &IdentityId,
        origin: &NetworkOrigin,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, CryptoError> {
        let expires_at = now + self.validity;
        let claims = Claims {
            exp: expires_at.timestamp(),
            sub: identity.to_string(),
            origin: origin.to_string(),
        };
        let header = Header::new(AcceptedAlgorithm::ISSUING.algorithm());
        let token = encode(&header, &claims, self.keys.encoding_key())
            .map_err(|e| CryptoError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }
}

// ── Validator ───────────────────────────────────────────────────────────────

/// Verifies presented credentials against the process key.
///
/// Stateless apart from the shared public key; safe to clone into every
/// request task.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: Arc<SigningKeyPair>,
}

impl TokenValidator {
    /// Validator for tokens signed by `keys`.
    pub fn new(keys: Arc<SigningKeyPair>) -> Self {
        Self { keys }
    }

    /// Validate `token` against the current time.
    pub fn validate(&self, token: &str) -> Result<VerifiedCredential, CredentialError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate `token` as if the current instant were `now`.
    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedCredential, CredentialError> {
        if token.trim().is_empty() {
            return Err(CredentialError::Missing);
        }

        let header = decode_header(token).map_err(|_| CredentialError::InvalidSignature)?;
        let accepted =
            AcceptedAlgorithm::from_header(header.alg).ok_or(CredentialError::InvalidSignature)?;

        // Expiry and subject are checked below so each failure keeps its own reason.
        let mut validation = Validation::new(accepted.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let data = decode::<PresentedClaims>(token, self.keys.decoding_key(), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::Json(_) | ErrorKind::Utf8(_) => CredentialError::MalformedClaims,
                _ => CredentialError::InvalidSignature,
            })?;
        let claims = data.claims;

        let exp = claims
            .exp
            .as_ref()
            .and_then(numeric_date)
            .ok_or(CredentialError::MalformedClaims)?;
        if exp <= now.timestamp() {
            return Err(CredentialError::Expired);
        }
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(CredentialError::MalformedClaims)?;

        let identity = claims
            .sub
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse::<IdentityId>().ok())
            .ok_or(CredentialError::MalformedClaims)?;

        let origin = claims
            .origin
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse::<NetworkOrigin>().ok());

        Ok(VerifiedCredential {
            identity,
            origin,
            expires_at,
        })
    }
}

/// Read a JWT NumericDate, tolerating fractional seconds.
fn numeric_date(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}
