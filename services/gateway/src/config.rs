//! services/gateway/src/config.rs
//!
//! Defines the gateway's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    pub user_agent: String,
    pub image_domain: String,
    pub taxonomy_path: PathBuf,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "127.0.0.1:8080");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Upstream Settings ---
        let upstream_base_url = var_or("UPSTREAM_BASE_URL", "https://nhentai.net")
            .trim_end_matches('/')
            .to_string();
        if upstream_base_url.is_empty() {
            return Err(ConfigError::MissingVar("UPSTREAM_BASE_URL".to_string()));
        }

        let timeout_str = var_or("UPSTREAM_TIMEOUT_SECS", "10");
        let upstream_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "UPSTREAM_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ))
            }
        };

        let user_agent = var_or("UPSTREAM_USER_AGENT", "nh-client");
        let image_domain = var_or("IMAGE_DOMAIN", "nhentai.net");

        // --- Static Data ---
        let taxonomy_path = PathBuf::from(var_or("TAXONOMY_PATH", "./tags.json"));
        let cors_origin = lookup("CORS_ORIGIN").filter(|origin| !origin.is_empty());

        Ok(Self {
            bind_address,
            log_level,
            upstream_base_url,
            upstream_timeout,
            user_agent,
            image_domain,
            taxonomy_path,
            cors_origin,
        })
    }
}
