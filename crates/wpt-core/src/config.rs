//! Configuration management
//!
//! Handles configuration from environment variables with sensible defaults
//! for development. Secrets default to obviously-unsafe placeholder values
//! that must be overridden in any real deployment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token issuance and password policy
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            config.database.pool_size = size.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                value: size,
            })?;
        }

        if let Ok(secret) = std::env::var("JWT_ACCESS_SECRET") {
            config.auth.access_secret = secret;
        }
        if let Ok(secret) = std::env::var("JWT_REFRESH_SECRET") {
            config.auth.refresh_secret = secret;
        }
        if let Ok(secs) = std::env::var("JWT_ACCESS_EXPIRATION_SECS") {
            config.auth.access_expiration_secs =
                secs.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JWT_ACCESS_EXPIRATION_SECS".to_string(),
                    value: secs,
                })?;
        }
        if let Ok(secs) = std::env::var("JWT_REFRESH_EXPIRATION_SECS") {
            config.auth.refresh_expiration_secs =
                secs.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JWT_REFRESH_EXPIRATION_SECS".to_string(),
                    value: secs,
                })?;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/warehouse".to_string(),
            pool_size: 10,
        }
    }
}

/// Token issuance configuration
///
/// Access and refresh tokens are signed with distinct secrets so a leaked
/// access-token secret cannot be used to forge refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime in seconds (default: 900 = 15 minutes)
    pub access_expiration_secs: u64,

    /// Refresh token lifetime in seconds (default: 604800 = 7 days)
    pub refresh_expiration_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: "development-access-secret-change-in-production".to_string(),
            refresh_secret: "development-refresh-secret-change-in-production".to_string(),
            access_expiration_secs: 900,
            refresh_expiration_secs: 7 * 24 * 3600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "wpt_api=debug,tower_http=debug".to_string(),
        }
    }
}
