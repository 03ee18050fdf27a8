use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub base_url: Option<String>,
    /// Resync the nonce clock against the exchange before loading markets
    pub adjust_for_time_difference: bool,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 4)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field(
            "adjust_for_time_difference",
            &self.adjust_for_time_difference,
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            adjust_for_time_difference: bool,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            base_url: helper.base_url,
            adjust_for_time_difference: helper.adjust_for_time_difference,
        })
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::read_only()
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: None,
            adjust_for_time_difference: false,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `MAX_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (e.g., `MAX_SECRET_KEY`)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_ADJUST_FOR_TIME_DIFFERENCE` (optional, defaults to false)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);
        let base_url_var = format!("{}_BASE_URL", prefix);
        let adjust_var = format!("{}_ADJUST_FOR_TIME_DIFFERENCE", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let base_url = env::var(&base_url_var).ok();

        let adjust_for_time_difference = match env::var(&adjust_var) {
            Ok(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{} must be true or false, got '{}'",
                    adjust_var, raw
                ))
            })?,
            Err(_) => false,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url,
            adjust_for_time_difference,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no file, fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    /// Create configuration for read-only operations (market data only)
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub const fn adjust_for_time_difference(mut self, adjust: bool) -> Self {
        self.adjust_for_time_difference = adjust;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
