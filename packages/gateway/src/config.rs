//! Gateway configuration.
//!
//! Defaults live in `config/gateway.toml`, embedded at compile time. At
//! runtime a different file can be supplied with `BLACKOUT_MAP_CONFIG`,
//! and individual fields overridden with `BLACKOUT_MAP_API_URL` and
//! `BLACKOUT_MAP_TIMEOUT_SECS`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../config/gateway.toml");

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "BLACKOUT_MAP_CONFIG";
/// Environment variable overriding [`GatewayConfig::base_url`].
pub const API_URL_ENV: &str = "BLACKOUT_MAP_API_URL";
/// Environment variable overriding [`GatewayConfig::timeout_secs`].
pub const TIMEOUT_ENV: &str = "BLACKOUT_MAP_TIMEOUT_SECS";

/// Errors from loading gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`GatewayConfig`].
    #[error("Invalid gateway config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Where the outage backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Scheme, host and port, without a trailing path.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Upper bound on autocomplete candidates kept per request.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Endpoint paths relative to `base_url`.
    pub endpoints: Endpoints,
}

/// Endpoint paths of the outage backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    /// Outages as of an instant (`?date=`).
    pub outages: String,
    /// Address autocomplete (`?input=`).
    pub suggestions: String,
    /// District reference list.
    pub districts: String,
    /// Per-building detail with neighbors
    /// (`?building_id=&date=&limit_neighbors=`).
    pub address_info: String,
}

const fn default_suggestion_limit() -> usize {
    10
}

impl Default for GatewayConfig {
    /// The embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `config/gateway.toml` is malformed, which
    /// the tests in this module rule out.
    fn default() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Embedded gateway config is invalid: {e}"))
    }
}

impl GatewayConfig {
    /// Loads configuration from `BLACKOUT_MAP_CONFIG` (or the embedded
    /// defaults) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or an override has an invalid value.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                log::info!("Loading gateway config from {}", path.display());
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                Some(contents)
            }
            Err(_) => None,
        };

        Self::from_sources(file.as_deref(), |var| std::env::var(var).ok())
    }

    /// Builds configuration from optional file contents and an environment
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the contents are not valid TOML or an
    /// override has an invalid value.
    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = match file {
            Some(contents) => toml::de::from_str(contents)?,
            None => Self::default(),
        };

        if let Some(url) = env(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(value) = env(TIMEOUT_ENV) {
            config.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: TIMEOUT_ENV,
                value,
            })?;
        }

        Ok(config)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins `base_url` and an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
