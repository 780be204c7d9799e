//! # Application State and Configuration
//!
//! [`AppConfig`] is read from the environment once at startup. [`AppState`]
//! is built from it and cloned into every handler: it carries the store,
//! the credential issuer and validator (sharing one process-lifetime key
//! pair), and the origin resolver. Nothing here is mutated after startup.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use murmur_crypto::{
    CryptoError, SigningKeyPair, TokenIssuer, TokenValidator, CREDENTIAL_VALIDITY_HOURS,
};
use thiserror::Error;

use crate::auth::AuthIssuer;
use crate::db::FeedStore;
use crate::origin::OriginResolver;

/// Fixed ceiling on handling time for a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ALLOWED_ORIGIN: &str = "*";

/// Error reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("TRUSTED_ORIGIN_HEADER is not a valid header name: {0:?}")]
    InvalidHeader(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the database URL, which usually embeds a password.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Value advertised in `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
    /// Reverse-proxy header trusted for origin resolution.
    pub trusted_origin_header: Option<HeaderName>,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub request_timeout: Duration,
    pub credential_validity: chrono::Duration,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let trusted_origin_header = var("TRUSTED_ORIGIN_HEADER")
            .map(|raw| {
                HeaderName::try_from(raw.trim()).map_err(|_| ConfigError::InvalidHeader(raw))
            })
            .transpose()?;

        Ok(Self {
            port,
            allowed_origin: var("HOST").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            trusted_origin_header,
            database_url: var("DATABASE_URL").or_else(|| var("POSTGRES_URL")),
            ..Self::default()
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("allowed_origin", &self.allowed_origin)
            .field("trusted_origin_header", &self.trusted_origin_header)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("credential_validity", &self.credential_validity)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            trusted_origin_header: None,
            database_url: None,
            request_timeout: REQUEST_TIMEOUT,
            credential_validity: chrono::Duration::hours(CREDENTIAL_VALIDITY_HOURS),
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn FeedStore>,
    pub issuer: AuthIssuer,
    pub validator: TokenValidator,
    pub resolver: OriginResolver,
}

impl AppState {
    /// Build state around `store`, generating the process signing key.
    pub fn new(config: AppConfig, store: Arc<dyn FeedStore>) -> Result<Self, CryptoError> {
        let keys = Arc::new(SigningKeyPair::generate()?);
        Ok(Self::with_keys(config, store, keys))
    }

    /// Build state around an existing key pair.
    pub fn with_keys(
        config: AppConfig,
        store: Arc<dyn FeedStore>,
        keys: Arc<SigningKeyPair>,
    ) -> Self {
        let tokens = TokenIssuer::with_validity(keys.clone(), config.credential_validity);
        let resolver = match &config.trusted_origin_header {
            Some(header) => OriginResolver::with_trusted_header(header.clone()),
            None => OriginResolver::peer_only(),
        };

        Self {
            issuer: AuthIssuer::new(store.clone(), tokens),
            validator: TokenValidator::new(keys),
            resolver,
            store,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.allowed_origin, "*");
        assert!(config.trusted_origin_header.is_none());
        assert!(config.database_url.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(8));
        assert_eq!(config.credential_validity, chrono::Duration::hours(48));
    }

    #[test]
    fn reads_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8081"),
            ("HOST", "https://feed.example"),
            ("TRUSTED_ORIGIN_HEADER", "X-Real-Ip"),
            ("DATABASE_URL", "postgres://u:p@db/feed"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.allowed_origin, "https://feed.example");
        assert_eq!(
            config.trusted_origin_header,
            Some(HeaderName::from_static("x-real-ip"))
        );
        assert_eq!(config.database_url.as_deref(), Some("postgres://u:p@db/feed"));
    }

    #[test]
    fn postgres_url_is_a_fallback() {
        let config =
            AppConfig::from_lookup(lookup(&[("POSTGRES_URL", "postgres://db/feed")])).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://db/feed"));

        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://primary/feed"),
            ("POSTGRES_URL", "postgres://fallback/feed"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://primary/feed"));
    }

    #[test]
    fn empty_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[("PORT", ""), ("HOST", " ")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.allowed_origin, "*");
    }

    #[test]
    fn bad_port_fails() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "abc")])),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "70000")])),
            Err(ConfigError::InvalidPort(_))
        ));
    }

    #[test]
    fn bad_header_fails() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("TRUSTED_ORIGIN_HEADER", "bad header")])),
            Err(ConfigError::InvalidHeader(_))
        ));
    }

    #[test]
    fn debug_redacts_database_url() {
        let config = AppConfig {
            database_url: Some("postgres://user:hunter2@db/feed".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
