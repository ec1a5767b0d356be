//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FEEDBRIDGE_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `FEEDBRIDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `FEEDBRIDGE_PORT` - Listen port (default: 3000)
//! - `FEEDBRIDGE_FETCH_TIMEOUT_SECS` - Remote feed fetch timeout
//!   (default: 30)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Default timeout for fetching a remote feed. A slow or unreachable partner
/// endpoint must not tie up a request worker indefinitely.
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Feedbridge server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Feed ingestion settings
    pub ingest: IngestConfig,
}

/// Settings for the ingestion pipeline.
///
/// Passed explicitly into the orchestrator at construction time; the
/// pipeline reads no process-wide state.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Timeout applied to remote feed fetches.
    pub fetch_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FEEDBRIDGE_DATABASE_URL")?;
        let host = get_env_or_default("FEEDBRIDGE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FEEDBRIDGE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FEEDBRIDGE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FEEDBRIDGE_PORT".to_string(), e.to_string()))?;
        let fetch_timeout_secs = get_env_or_default(
            "FEEDBRIDGE_FETCH_TIMEOUT_SECS",
            &DEFAULT_FETCH_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("FEEDBRIDGE_FETCH_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            ingest: IngestConfig {
                fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            ingest: IngestConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_default_fetch_timeout() {
        let ingest = IngestConfig::default();
        assert_eq!(ingest.fetch_timeout, Duration::from_secs(30));
    }
}
