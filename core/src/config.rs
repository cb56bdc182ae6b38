//! Client configuration.
//!
//! A `ClientConfig` is fixed once built: base URL, optional bearer token and
//! request timeout. It can be assembled in code or read from
//! `THUNDERSTORE_*` environment variables.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://thunderstore.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("thunderstore-sdk/", env!("CARGO_PKG_VERSION"));

const ENV_PREFIX: &str = "THUNDERSTORE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to read configuration from the environment: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    api_token: Option<String>,
    timeout: Duration,
}

/// Shape of the `THUNDERSTORE_*` variables; every one is optional.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with no token and the default timeout.
    ///
    /// The URL must be absolute `http` or `https` with a host; a path prefix
    /// is kept and endpoint paths are appended to it. The URL is stored
    /// normalized, so a bare host reads back with a trailing `/`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if !url.has_host() || url.cannot_be_a_base() {
            return Err(invalid("expected an absolute URL with a host".to_string()));
        }
        Ok(Self {
            base_url: url,
            ..Self::default()
        })
    }

    /// Attach a bearer token. An empty token is treated as no token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `THUNDERSTORE_BASE_URL`, `THUNDERSTORE_API_TOKEN` and
    /// `THUNDERSTORE_TIMEOUT_SECS`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`ClientConfig::from_env`] but over an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        let mut config = match env.base_url.as_deref() {
            Some(url) => Self::new(url)?,
            None => Self::default(),
        };
        if let Some(token) = env.api_token {
            config = config.with_api_token(token);
        }
        if let Some(secs) = env.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
