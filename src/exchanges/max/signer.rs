use crate::core::errors::ExchangeError;
use crate::core::kernel::{hmac_sha256_hex, RequestParams, SignatureResult, Signer};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

pub const HEADER_ACCESS_KEY: &str = "X-MAX-ACCESSKEY";
pub const HEADER_PAYLOAD: &str = "X-MAX-PAYLOAD";
pub const HEADER_SIGNATURE: &str = "X-MAX-SIGNATURE";

/// MAX HMAC-SHA256 signer for private endpoints
///
/// The signed payload is the request parameters extended with `nonce` and
/// `path`, serialized as JSON with sorted keys and base64-encoded. The
/// signature is the hex HMAC of that encoded payload.
pub struct MaxSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl std::fmt::Debug for MaxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxSigner").finish_non_exhaustive()
    }
}

impl MaxSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// Base64 of the JSON-serialized signed parameter set
    pub fn encode_payload(signed: &RequestParams) -> Result<String, ExchangeError> {
        Ok(STANDARD.encode(signed.to_json_string()?))
    }
}

impl Signer for MaxSigner {
    fn sign_request(
        &self,
        _method: &str,
        path: &str,
        params: &RequestParams,
        nonce: i64,
    ) -> SignatureResult {
        if self.api_key.expose_secret().is_empty() || self.secret_key.expose_secret().is_empty() {
            return Err(ExchangeError::AuthenticationError(
                "max requires apiKey and secret credentials".to_string(),
            ));
        }

        let signed = params.clone().with("nonce", nonce).with("path", path);
        let payload = Self::encode_payload(&signed)?;
        let signature = hmac_sha256_hex(
            self.secret_key.expose_secret().as_bytes(),
            payload.as_bytes(),
        )?;

        let mut headers = HashMap::new();
        headers.insert(
            HEADER_ACCESS_KEY.to_string(),
            self.api_key.expose_secret().clone(),
        );
        headers.insert(HEADER_PAYLOAD.to_string(), payload);
        headers.insert(HEADER_SIGNATURE.to_string(), signature);

        Ok((headers, signed))
    }
}
