//! Configuration management for the session layer.

use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        })
    }
}

/// Session configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the dashboard API
    pub api_url: Url,
    pub app_name: String,
    pub environment: Environment,
    /// Sent verbatim as the `Cookie` header when set
    pub session_cookie: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("DASHKIT_API_URL").ok_or(ConfigError::MissingVar("DASHKIT_API_URL"))?;
        let api_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let app_name = lookup("DASHKIT_APP_NAME").unwrap_or_else(|| "dashkit".to_string());

        let environment = match lookup("DASHKIT_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };

        let session_cookie = lookup("DASHKIT_SESSION_COOKIE").filter(|c| !c.is_empty());

        let http_timeout = lookup("DASHKIT_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            api_url,
            app_name,
            environment,
            session_cookie,
            http_timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("Invalid DASHKIT_API_URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid DASHKIT_ENV value: {0}")]
    InvalidEnvironment(String),

    #[error("Invalid DASHKIT_HTTP_TIMEOUT_SECS value")]
    InvalidTimeout,
}
