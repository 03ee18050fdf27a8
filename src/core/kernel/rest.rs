use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace};

/// A fully prepared HTTP request: final URL, headers and optional body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// A decoded HTTP response; an empty body decodes to `Value::Null`
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// REST transport trait
///
/// The transport performs the network call and JSON-decodes the body. It
/// owns timeouts, throttling and connectivity failures; exchange-level
/// error envelopes are left in the returned body for the caller to
/// classify.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError>;
}

#[async_trait]
impl<T: RestClient + ?Sized> RestClient for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        (**self).send(request).await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Minimum spacing between requests in milliseconds; 0 disables throttling
    pub rate_limit_ms: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(exchange_name: String) -> Self {
        Self {
            exchange_name,
            timeout_seconds: 30,
            rate_limit_ms: 0,
            user_agent: "maxx/0.1".to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the minimum spacing between requests
    pub fn with_rate_limit(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()?;

        let limiter = Quota::with_period(Duration::from_millis(self.config.rate_limit_ms))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Ok(ReqwestRest {
            client,
            config: self.config,
            limiter,
        })
    }
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("throttled", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn new(exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(exchange_name)).build()
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<HttpResponse, ExchangeError> {
        let status = response.status().as_u16();
        let response_text = response.text().await?;

        trace!("Response body: {}", response_text);
        decode_body(status, response_text)
    }
}

/// Decode a response body; an empty body is `null`, and unparseable text on
/// a failure status is reported as an API error carrying the raw text
fn decode_body(status: u16, text: String) -> Result<HttpResponse, ExchangeError> {
    if text.trim().is_empty() {
        return Ok(HttpResponse {
            status,
            body: Value::Null,
        });
    }

    match serde_json::from_str(&text) {
        Ok(body) => Ok(HttpResponse { status, body }),
        Err(e) if (200..300).contains(&status) => Err(e.into()),
        Err(_) => Err(ExchangeError::ApiError {
            code: i32::from(status),
            message: text,
        }),
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, request), fields(exchange = %self.config.exchange_name, method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let mut builder = self.client.request(request.method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        self.handle_response(response).await
    }
}
