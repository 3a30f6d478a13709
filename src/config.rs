//! Client configuration.
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary through `dotenvy`). Defaults target a local backend.

use std::str::FromStr;

use url::Url;

/// Default backend when `CAS_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default cron expression for the agenda watcher: every 5 minutes.
pub const DEFAULT_WATCH_SCHEDULE: &str = "0 */5 * * * *";

/// Deployment tag of the backend the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Qa,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Qa => "qa",
            Self::Prod => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "qa" => Ok(Self::Qa),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Configuration for connecting to the CAS backend.
///
/// `Debug` is implemented by hand so the token never reaches log output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL that relative API paths are resolved against.
    pub api_url: Url,
    /// Bearer token (an identity-provider id token), if any.
    pub api_token: Option<String>,
    pub environment: Environment,
    /// Inscription whose installments the agenda watcher reports on.
    pub inscription_id: Option<u64>,
    /// Cron expression driving the agenda watcher.
    pub watch_schedule: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("environment", &self.environment)
            .field("inscription_id", &self.inscription_id)
            .field("watch_schedule", &self.watch_schedule)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_token: None,
            environment: Environment::default(),
            inscription_id: None,
            watch_schedule: DEFAULT_WATCH_SCHEDULE.to_string(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CAS_API_URL` (default: `http://localhost:8080`)
    /// - `CAS_API_TOKEN` (optional)
    /// - `CAS_ENVIRONMENT` (`dev`, `qa` or `prod`; default `dev`)
    /// - `CAS_INSCRIPTION_ID` (optional)
    /// - `CAS_WATCH_SCHEDULE` (default: `0 */5 * * * *`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CAS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("CAS_API_URL".to_string(), e.to_string()))?;

        let environment = lookup("CAS_ENVIRONMENT")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();

        let inscription_id = lookup("CAS_INSCRIPTION_ID")
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidInscriptionId(s.clone()))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            api_token: lookup("CAS_API_TOKEN").filter(|t| !t.trim().is_empty()),
            environment,
            inscription_id,
            watch_schedule: lookup("CAS_WATCH_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_WATCH_SCHEDULE.to_string()),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unknown environment '{0}', expected dev, qa or prod")]
    InvalidEnvironment(String),
    #[error("CAS_INSCRIPTION_ID must be a number, got '{0}'")]
    InvalidInscriptionId(String),
}
