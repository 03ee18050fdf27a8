use crate::core::accessors::safe_string;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{
    encode_query, implode_path, HttpRequest, NonceGenerator, RequestParams, RestClient, Signer,
};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, trace};

pub const EXCHANGE_ID: &str = "max";
pub const DEFAULT_BASE_URL: &str = "https://max-api.maicoin.com";
pub const API_PREFIX: &str = "/api/v2/";

/// Exchange error codes with a specific failure kind; any other code is a
/// generic exchange error
pub const ERROR_CODES: &[(&str, ErrorKind)] = &[
    ("2004", ErrorKind::OrderNotFound),
    // signature is incorrect
    ("2005", ErrorKind::Authentication),
    // nonce already used by this access key
    ("2006", ErrorKind::Authentication),
    // nonce more than 30 seconds away from server time
    ("2007", ErrorKind::Authentication),
    ("2008", ErrorKind::Authentication),
    ("2009", ErrorKind::Authentication),
    // out of access key scopes
    ("2011", ErrorKind::Authentication),
    // payload inconsistent with body, or wrong path in payload
    ("2014", ErrorKind::Authentication),
    ("2015", ErrorKind::Authentication),
    // amount too small
    ("2016", ErrorKind::InvalidOrder),
    // cannot lock funds
    ("2018", ErrorKind::InsufficientFunds),
];

pub fn classify_code(code: &str) -> ErrorKind {
    ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(ErrorKind::Exchange, |(_, kind)| *kind)
}

/// Raise the classified error when `body` carries an `{"error": {"code", "message"}}`
/// envelope.
///
/// A bare-string `error` or no `error` at all is not a failure here.
pub fn check_error_envelope(body: &Value) -> Result<(), ExchangeError> {
    let Some(error) = body.get("error").filter(|e| e.is_object()) else {
        return Ok(());
    };
    let Some(code) = safe_string(error, "code").filter(|c| !c.is_empty()) else {
        return Ok(());
    };
    let message = safe_string(error, "message").unwrap_or_default();
    let feedback = format!("{} {}", EXCHANGE_ID, message);
    Err(classify_code(&code).into_error(feedback))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Public,
    Private,
}

/// Thin wrapper around `RestClient` speaking the MAX v2 dialect
pub struct MaxRest<R: RestClient> {
    client: R,
    base_url: String,
    signer: Option<Arc<dyn Signer>>,
    nonce: NonceGenerator,
}

impl<R: RestClient> MaxRest<R> {
    pub fn new(
        client: R,
        base_url: String,
        signer: Option<Arc<dyn Signer>>,
        nonce: NonceGenerator,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
            nonce,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn nonce(&self) -> &NonceGenerator {
        &self.nonce
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// Turn `(method, path template, params)` into the final request.
    ///
    /// Private requests are signed and their signed parameter set (with
    /// `nonce` and `path`) is what goes on the wire: as the query string for
    /// GET/DELETE, as a JSON body for everything else.
    pub fn prepare(
        &self,
        method: &Method,
        template: &str,
        api: Api,
        mut params: RequestParams,
    ) -> Result<HttpRequest, ExchangeError> {
        let path = format!("{}{}", API_PREFIX, implode_path(template, &mut params)?);
        let mut url = format!("{}{}", self.base_url, path);
        let mut headers = HashMap::new();

        let params = match api {
            Api::Public => params,
            Api::Private => {
                let signer = self.signer.as_ref().ok_or_else(|| {
                    ExchangeError::AuthenticationError(format!(
                        "{} requires apiKey and secret credentials",
                        EXCHANGE_ID
                    ))
                })?;
                let (auth_headers, signed) =
                    signer.sign_request(method.as_str(), &path, &params, self.nonce.next())?;
                headers.extend(auth_headers);
                signed
            }
        };

        let body = if *method == Method::GET || *method == Method::DELETE {
            if !params.is_empty() {
                url.push('?');
                url.push_str(&encode_query(&params));
            }
            None
        } else {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
            Some(params.to_json_string()?)
        };

        Ok(HttpRequest {
            method: method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Send a request and return the body once the error envelope is cleared
    #[instrument(skip(self, params), fields(exchange = EXCHANGE_ID, method = %method, path = template))]
    pub async fn request(
        &self,
        method: Method,
        template: &str,
        api: Api,
        params: RequestParams,
    ) -> Result<Value, ExchangeError> {
        let request = self.prepare(&method, template, api, params)?;
        let response = self.client.send(request).await?;
        trace!(status = response.status, "max response received");

        check_error_envelope(&response.body)?;
        if !response.is_success() {
            return Err(ExchangeError::ApiError {
                code: i32::from(response.status),
                message: response.body.to_string(),
            });
        }
        Ok(response.body)
    }

    async fn public_get(&self, template: &str, params: RequestParams) -> Result<Value, ExchangeError> {
        self.request(Method::GET, template, Api::Public, params).await
    }

    async fn private_get(&self, template: &str, params: RequestParams) -> Result<Value, ExchangeError> {
        self.request(Method::GET, template, Api::Private, params).await
    }

    async fn private_post(&self, template: &str, params: RequestParams) -> Result<Value, ExchangeError> {
        self.request(Method::POST, template, Api::Private, params).await
    }

    pub async fn get_markets(&self) -> Result<Value, ExchangeError> {
        self.public_get("markets", RequestParams::new()).await
    }

    pub async fn get_currencies(&self) -> Result<Value, ExchangeError> {
        self.public_get("currencies", RequestParams::new()).await
    }

    pub async fn get_withdrawal_constraints(&self) -> Result<Value, ExchangeError> {
        self.public_get("withdrawal/constraint", RequestParams::new())
            .await
    }

    /// Server time in seconds
    pub async fn get_timestamp(&self) -> Result<Value, ExchangeError> {
        self.public_get("timestamp", RequestParams::new()).await
    }

    pub async fn get_ticker(&self, market_id: &str) -> Result<Value, ExchangeError> {
        self.public_get(
            "tickers/{market_id}",
            RequestParams::new().with("market_id", market_id),
        )
        .await
    }

    /// All tickers as an object keyed by market id
    pub async fn get_tickers(&self) -> Result<Value, ExchangeError> {
        self.public_get("tickers", RequestParams::new()).await
    }

    pub async fn get_depth(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.public_get("depth", params).await
    }

    pub async fn get_trades(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.public_get("trades", params).await
    }

    pub async fn get_klines(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.public_get("k", params).await
    }

    pub async fn get_accounts(&self) -> Result<Value, ExchangeError> {
        self.private_get("members/accounts", RequestParams::new())
            .await
    }

    pub async fn get_orders(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_get("orders", params).await
    }

    pub async fn get_order(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_get("order", params).await
    }

    pub async fn create_order(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_post("orders", params).await
    }

    pub async fn cancel_order(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_post("order/delete", params).await
    }

    pub async fn cancel_orders(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_post("orders/clear", params).await
    }

    pub async fn get_my_trades(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_get("trades/my", params).await
    }

    pub async fn get_deposits(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_get("deposits", params).await
    }

    pub async fn get_withdrawals(&self, params: RequestParams) -> Result<Value, ExchangeError> {
        self.private_get("withdrawals", params).await
    }

    pub async fn get_deposit_addresses(&self, currency_id: &str) -> Result<Value, ExchangeError> {
        self.private_get(
            "deposit_addresses",
            RequestParams::new().with("currency", currency_id),
        )
        .await
    }

    pub async fn create_deposit_address(&self, currency_id: &str) -> Result<Value, ExchangeError> {
        self.private_post(
            "deposit_addresses",
            RequestParams::new().with("currency", currency_id),
        )
        .await
    }
}
