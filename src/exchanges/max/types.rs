use crate::core::errors::ExchangeError;
use crate::core::kernel::RequestParams;
use serde::{Deserialize, Serialize};

/// Order states the exchange reports for resting orders
pub const OPEN_ORDER_STATES: [&str; 3] = ["wait", "convert", "finalizing"];
/// Order states the exchange reports for finished orders
pub const CLOSED_ORDER_STATES: [&str; 3] = ["done", "cancel", "failed"];

/// Body of `POST orders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxOrderRequest {
    pub market: String,
    pub side: String,
    pub volume: String,
    pub ord_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_oid: Option<String>,
}

impl MaxOrderRequest {
    pub fn to_params(&self) -> Result<RequestParams, ExchangeError> {
        let value = serde_json::to_value(self).map_err(|e| {
            ExchangeError::SerializationError(format!("Failed to serialize order: {}", e))
        })?;
        let mut params = RequestParams::new();
        if let serde_json::Value::Object(fields) = value {
            for (key, field) in fields {
                params.insert(&key, field);
            }
        }
        Ok(params)
    }
}
