//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FERNWAY_API_BASE_URL` - Base URL of the Fernway REST backend
//!
//! ## Optional
//! - `FERNWAY_ENV` - `development` or `production` (default: development)
//! - `FERNWAY_SESSION_FILE` - Path of the session store file
//!   (default: `.fernway/session.json` under the user's home directory in
//!   production, under the working directory in development)
//! - `FERNWAY_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment the client runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvVar(
                "FERNWAY_ENV".to_string(),
                format!("unknown environment '{other}'"),
            )),
        }
    }

    /// Whether this is a production deployment.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the Fernway REST backend.
    pub api_base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Deployment environment.
    pub environment: Environment,
    /// Path of the session store file.
    pub session_file: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("FERNWAY_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FERNWAY_API_BASE_URL".to_string(), e.to_string())
            })?;

        let environment = match get_optional_env("FERNWAY_ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::default(),
        };

        let timeout_secs = get_env_or_default(
            "FERNWAY_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("FERNWAY_API_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let session_file = get_optional_env("FERNWAY_SESSION_FILE")
            .map_or_else(|| default_session_file(environment), PathBuf::from);

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            environment,
            session_file,
        })
    }
}

/// Default session file location for the given environment.
///
/// Production installs keep the session under the user's home directory;
/// development keeps it next to the working tree so parallel checkouts
/// don't share logins.
fn default_session_file(environment: Environment) -> PathBuf {
    let base = if environment.is_production() {
        std::env::home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(".")
    };
    base.join(".fernway").join("session.json")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
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
    fn test_environment_parse() {
        assert_eq!(
            Environment::parse("development").unwrap(),
            Environment::Development
        );
        assert_eq!(Environment::parse("prod").unwrap(), Environment::Production);
        assert!(Environment::parse("staging").is_err());
    }

    #[test]
    fn test_default_session_file_development() {
        let path = default_session_file(Environment::Development);
        assert!(path.ends_with(".fernway/session.json"));
        assert!(path.starts_with("."));
    }

    #[test]
    fn test_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }
}
