/// Transport kernel shared by exchange adapters
///
/// The kernel holds only exchange-agnostic plumbing. Adapters build on it
/// and keep their own dialect (paths, payload shapes, error codes) to
/// themselves.
///
/// # Components
///
/// ## Transport
/// - `RestClient`: sends a prepared `HttpRequest` and returns the decoded body
/// - `ReqwestRest`: default implementation with timeout and request throttling
///
/// ## Request building
/// - `RequestParams` / `ParamValue`: parameters that are either scalars or lists
/// - `implode_path`: fills `{placeholder}` segments from parameters
/// - `encode_query`: URL-encodes scalars then `key[]=` lists
///
/// ## Authentication
/// - `Signer`: pluggable request signing
/// - `NonceGenerator`: clock minus a shared, resyncable offset
///
/// # Example
/// ```rust,no_run
/// use maxx::core::kernel::*;
/// use reqwest::Method;
/// use std::collections::HashMap;
///
/// # async fn example() -> Result<(), maxx::core::errors::ExchangeError> {
/// let rest = RestClientBuilder::new(
///     RestClientConfig::new("max".to_string()).with_rate_limit(1200),
/// )
/// .build()?;
///
/// let params = RequestParams::new().with("market", "btcusdt").with("limit", 5);
/// let response = rest
///     .send(HttpRequest {
///         method: Method::GET,
///         url: format!("https://max-api.maicoin.com/api/v2/depth?{}", encode_query(&params)),
///         headers: HashMap::new(),
///         body: None,
///     })
///     .await?;
/// println!("{}", response.body);
/// # Ok(())
/// # }
/// ```
pub mod clock;
pub mod params;
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use clock::{Clock, NonceGenerator, SystemClock, TimeOffset};
pub use params::{encode_query, implode_path, ParamValue, RequestParams};
pub use rest::{
    HttpRequest, HttpResponse, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
};
pub use signer::{hmac_sha256_hex, SignatureResult, Signer};
