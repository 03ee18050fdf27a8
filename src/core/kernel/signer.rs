use crate::core::errors::ExchangeError;
use crate::core::kernel::params::RequestParams;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

/// Result type for signing operations: (headers, `signed_params`)
pub type SignatureResult = Result<(HashMap<String, String>, RequestParams), ExchangeError>;

/// Signer trait for request authentication
///
/// Implementations turn an outgoing request into the authentication headers
/// the exchange expects, and return the parameter set that must go on the
/// wire (which may include fields injected for signing, such as a nonce).
pub trait Signer: Send + Sync {
    /// Sign a request and return headers and the parameters to send
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `path` - Request path without host, e.g. `/api/v2/orders`
    /// * `params` - Request parameters after path placeholders were consumed
    /// * `nonce` - Request nonce in milliseconds
    fn sign_request(
        &self,
        method: &str,
        path: &str,
        params: &RequestParams,
        nonce: i64,
    ) -> SignatureResult;
}

/// Hex-encoded HMAC-SHA256 of `message` keyed with `secret`
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> Result<String, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|e| {
        ExchangeError::AuthenticationError(format!("Invalid secret key: {}", e))
    })?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
