//! services/dashboard/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::fmt;
use std::net::SocketAddr;
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
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub api_host: String,
    /// Password used for every student's credential exchange.
    pub api_login_password: String,
    pub http_timeout: Duration,
    pub log_level: Level,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("mongodb_database", &self.mongodb_database)
            .field("api_host", &self.api_host)
            .field("http_timeout", &self.http_timeout)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
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

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Document Store Settings ---
        let mongodb_uri = required("MONGODB_URI")?;
        let mongodb_database = std::env::var("MONGODB_DATABASE")
            .unwrap_or_else(|_| "vocaelis_development".to_string());

        // --- Load API Settings ---
        let api_host = required("API_HOST")?.trim_end_matches('/').to_string();
        let api_login_password = required("API_LOGIN_PASSWORD")?;

        let timeout_str = std::env::var("HTTP_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let http_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("HTTP_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            bind_address,
            mongodb_uri,
            mongodb_database,
            api_host,
            api_login_password,
            http_timeout,
            log_level,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}
