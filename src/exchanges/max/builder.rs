use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Clock, NonceGenerator, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig, Signer,
    SystemClock, TimeOffset,
};
use crate::exchanges::max::connector::{MaxConnector, MaxContext};
use crate::exchanges::max::rest::{MaxRest, DEFAULT_BASE_URL, EXCHANGE_ID};
use crate::exchanges::max::signer::MaxSigner;
use std::sync::Arc;

/// Minimum spacing between requests the exchange tolerates, in milliseconds
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1200;

/// Builder for creating MAX exchange connectors
///
/// Private endpoints are only signed when the configuration carries both
/// an API key and a secret; without them, public endpoints still work and
/// private ones fail with an authentication error.
pub struct MaxBuilder {
    config: ExchangeConfig,
    rest_timeout: u64,
    rate_limit_ms: u64,
    user_agent: Option<String>,
    clock: Arc<dyn Clock>,
}

impl Default for MaxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxBuilder {
    /// Create a new `MaxBuilder` with default settings
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            rest_timeout: 30,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            user_agent: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the exchange configuration
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set API credentials, keeping the rest of the configuration
    pub fn with_credentials(mut self, api_key: String, secret_key: String) -> Self {
        let mut config = ExchangeConfig::new(api_key, secret_key)
            .adjust_for_time_difference(self.config.adjust_for_time_difference);
        config.base_url = self.config.base_url.take();
        self.config = config;
        self
    }

    /// Set REST request timeout in seconds
    pub fn with_rest_timeout(mut self, timeout: u64) -> Self {
        self.rest_timeout = timeout;
        self
    }

    /// Set the minimum spacing between requests; 0 disables throttling
    pub fn with_rate_limit(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit_ms = rate_limit_ms;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Replace the clock nonces are derived from
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build a connector on the default reqwest transport
    pub fn build(self) -> Result<MaxConnector<ReqwestRest>, ExchangeError> {
        let mut rest_config = RestClientConfig::new(EXCHANGE_ID.to_string())
            .with_timeout(self.rest_timeout)
            .with_rate_limit(self.rate_limit_ms);
        if let Some(user_agent) = self.user_agent.clone() {
            rest_config = rest_config.with_user_agent(user_agent);
        }

        let client = RestClientBuilder::new(rest_config).build()?;
        Ok(self.build_with_client(client))
    }

    /// Build a connector on a caller-supplied transport
    pub fn build_with_client<R: RestClient>(self, client: R) -> MaxConnector<R> {
        let base_url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let signer: Option<Arc<dyn Signer>> = self.config.has_credentials().then(|| {
            Arc::new(MaxSigner::new(
                self.config.api_key().to_string(),
                self.config.secret_key().to_string(),
            )) as Arc<dyn Signer>
        });

        let nonce = NonceGenerator::new(self.clock, TimeOffset::default());
        let rest = MaxRest::new(client, base_url, signer, nonce);
        MaxConnector::new(MaxContext::new(
            rest,
            self.config.adjust_for_time_difference,
        ))
    }
}

/// Create a MAX connector with REST-only support
pub fn build_connector(config: ExchangeConfig) -> Result<MaxConnector<ReqwestRest>, ExchangeError> {
    MaxBuilder::new().with_config(config).build()
}
