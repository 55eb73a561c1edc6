//! Client configuration: API key, target environment and transport knobs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiError;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "TONICPOW_API_KEY";
/// Environment variable selecting the environment (`live`, `staging`, ...).
pub const ENV_ENVIRONMENT: &str = "TONICPOW_ENVIRONMENT";
/// Environment variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT_SECONDS: &str = "TONICPOW_TIMEOUT_SECONDS";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
/// Stands in for secrets in `Debug` output.
pub(crate) const REDACTED: &str = "<redacted>";

const DEFAULT_USER_AGENT: &str = concat!("tonicpow-rust/", env!("CARGO_PKG_VERSION"));

/// Which API deployment the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Live,
    Staging,
    Development,
    Local,
    /// Any other base URL, e.g. a mock server. Should include the version
    /// prefix (`.../v1`).
    Custom(String),
}

impl Environment {
    /// Base URL including the API version, without a trailing slash.
    pub fn base_url(&self) -> &str {
        match self {
            Environment::Live => "https://api.tonicpow.com/v1",
            Environment::Staging => "https://apistaging.tonicpow.com/v1",
            Environment::Development => "https://apidev.tonicpow.com/v1",
            Environment::Local => "http://localhost:3000/v1",
            Environment::Custom(url) => url.trim_end_matches('/'),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Environment::Live => "live",
            Environment::Staging => "staging",
            Environment::Development => "development",
            Environment::Local => "local",
            Environment::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Custom(url) => write!(f, "custom({url})"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "live" | "production" | "prod" => Ok(Environment::Live),
            "staging" | "stage" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            "local" | "localhost" => Ok(Environment::Local),
            lower if lower.starts_with("http://") || lower.starts_with("https://") => {
                Ok(Environment::Custom(trimmed.to_string()))
            }
            _ => Err(ApiError::Configuration(format!("unknown environment: {trimmed}"))),
        }
    }
}

/// Everything a `Client` needs besides its transport.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub environment: Environment,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &REDACTED)
            .field("environment", &self.environment)
            .field("user_agent", &self.user_agent)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, environment: Environment) -> Self {
        Self {
            api_key: api_key.into(),
            environment,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Load configuration from `TONICPOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the API key is missing or the
    /// environment or timeout cannot be parsed.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::Configuration(format!("api key is required: {ENV_API_KEY}")))?;

        let environment = match lookup(ENV_ENVIRONMENT) {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let mut config = Self::new(api_key, environment);
        if let Some(raw) = lookup(ENV_TIMEOUT_SECONDS) {
            config.timeout_seconds = raw.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("invalid {ENV_TIMEOUT_SECONDS}: {raw}"))
            })?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout in seconds. `0` disables the timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The timeout handed to the transport; `None` when `timeout_seconds`
    /// is zero.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn base_url(&self) -> &str {
        self.environment.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_parses_known_names() {
        assert_eq!("live".parse::<Environment>().unwrap(), Environment::Live);
        assert_eq!("Staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("".parse::<Environment>().unwrap(), Environment::Live);
    }

    #[test]
    fn environment_accepts_custom_url() {
        let env: Environment = "http://127.0.0.1:4000/v1/".parse().unwrap();
        assert_eq!(env.base_url(), "http://127.0.0.1:4000/v1");
    }

    #[test]
    fn environment_rejects_unknown_name() {
        let err = "moon".parse::<Environment>().unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn from_lookup_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "key"),
            (ENV_ENVIRONMENT, "staging"),
            (ENV_TIMEOUT_SECONDS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.base_url(), "https://apistaging.tonicpow.com/v1");
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "key"),
            (ENV_TIMEOUT_SECONDS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "key"),
            (ENV_TIMEOUT_SECONDS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.timeout_seconds, 0);
        assert_eq!(config.timeout(), None);

        let config = config.with_timeout_seconds(7);
        assert_eq!(config.timeout(), Some(Duration::from_secs(7)));
        assert_eq!(
            ClientConfig::new("key", Environment::Local).timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = ClientConfig::new("super-secret-key", Environment::Local);
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-key"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("Local"));
    }
}
