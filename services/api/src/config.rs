//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
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
    pub mongodb_uri: String,
    pub database_name: String,
    pub log_level: Level,
    pub stripe_secret_key: String,
    pub identity_api_key: String,
    pub client_origin: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let mongodb_uri = std::env::var("MONGODB_URI")
            .map_err(|_| ConfigError::MissingVar("MONGODB_URI".to_string()))?;

        let database_name =
            std::env::var("DATABASE_NAME").unwrap_or_else(|_| "lessonsDB".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load External Service Credentials ---
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::MissingVar("STRIPE_SECRET_KEY".to_string()))?;

        let identity_api_key = std::env::var("IDENTITY_API_KEY")
            .map_err(|_| ConfigError::MissingVar("IDENTITY_API_KEY".to_string()))?;

        // --- Load Client-facing Settings ---
        // The origin the payment provider redirects back to after checkout.
        let client_origin = std::env::var("CLIENT_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let cors_origins_str = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:5174".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();
        if cors_origins.is_empty() {
            return Err(ConfigError::InvalidValue(
                "CORS_ORIGINS".to_string(),
                "must list at least one origin".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            mongodb_uri,
            database_name,
            log_level,
            stripe_secret_key,
            identity_api_key,
            client_origin,
            cors_origins,
        })
    }
}
