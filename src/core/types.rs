use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lower/upper bound pair; either side may be unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MinMax {
    pub const fn min(min: Option<f64>) -> Self {
        Self { min, max: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLimits {
    pub amount: MinMax,
    pub price: MinMax,
    pub deposit: MinMax,
    pub withdraw: MinMax,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingFees {
    pub withdraw_fee: Option<f64>,
    pub deposit_fee: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub fiat: bool,
    pub precision: Option<i64>,
    pub limits: CurrencyLimits,
    pub funding: FundingFees,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPrecision {
    /// Decimal places allowed for the order amount (base currency)
    pub amount: Option<u32>,
    /// Decimal places allowed for the order price (quote currency)
    pub price: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLimits {
    pub amount: MinMax,
    pub price: MinMax,
    pub cost: MinMax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub base_id: String,
    pub quote_id: String,
    pub active: bool,
    pub precision: MarketPrecision,
    pub limits: MarketLimits,
    pub info: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub last: Option<f64>,
    pub change: Option<f64>,
    pub percentage: Option<f64>,
    pub average: Option<f64>,
    pub base_volume: Option<f64>,
    pub quote_volume: Option<f64>,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: f64,
    pub amount: f64,
}

/// Bids are kept in descending and asks in ascending price order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&OrderBookEntry> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&OrderBookEntry> {
        self.asks.first()
    }
}

/// A single OHLCV candle; `timestamp` is the candle open time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
    #[serde(rename = "self-trade")]
    SelfTrade,
    #[serde(untagged)]
    Other(String),
}

impl OrderSide {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::SelfTrade => "self-trade",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    StopLimit,
    StopMarket,
    PostOnly,
    IocLimit,
    #[serde(untagged)]
    Other(String),
}

impl OrderType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::StopLimit => "stop_limit",
            Self::StopMarket => "stop_market",
            Self::PostOnly => "post_only",
            Self::IocLimit => "ioc_limit",
            Self::Other(raw) => raw,
        }
    }

    /// Whether a limit price must accompany an order of this type
    pub fn requires_price(&self) -> bool {
        matches!(
            self,
            Self::Limit | Self::StopLimit | Self::PostOnly | Self::IocLimit
        )
    }

    /// Whether a trigger price must accompany an order of this type
    pub fn requires_stop_price(&self) -> bool {
        matches!(self, Self::StopLimit | Self::StopMarket)
    }
}

impl From<&str> for OrderType {
    fn from(raw: &str) -> Self {
        match raw {
            "market" => Self::Market,
            "limit" => Self::Limit,
            "stop_limit" => Self::StopLimit,
            "stop_market" => Self::StopMarket,
            "post_only" => Self::PostOnly,
            "ioc_limit" => Self::IocLimit,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fee {
    pub cost: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub order: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<OrderSide>,
    pub taker_or_maker: Option<TakerOrMaker>,
    pub price: Option<f64>,
    pub amount: Option<f64>,
    pub cost: Option<f64>,
    pub fee: Option<Fee>,
    pub info: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub last_trade_timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub order_type: Option<OrderType>,
    pub side: Option<OrderSide>,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub amount: Option<f64>,
    pub filled: Option<f64>,
    pub remaining: Option<f64>,
    pub average: Option<f64>,
    pub cost: Option<f64>,
    pub status: Option<OrderStatus>,
    pub trades_count: Option<i64>,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Ok,
    Failed,
    Canceled,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub txid: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub updated: Option<i64>,
    pub transaction_type: TransactionType,
    pub currency: Option<String>,
    pub amount: Option<f64>,
    pub address: Option<String>,
    pub status: Option<TransactionStatus>,
    pub fee: Fee,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub free: f64,
    pub used: f64,
    pub total: f64,
}

impl Balance {
    /// Build a balance whose total is exactly `free + used`
    pub fn new(free: f64, used: f64) -> Self {
        Self {
            free,
            used,
            total: free + used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub balances: BTreeMap<String, Balance>,
    pub info: Value,
}

impl Balances {
    pub fn get(&self, code: &str) -> Option<&Balance> {
        self.balances.get(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositAddress {
    pub currency: String,
    pub address: String,
    pub tag: Option<String>,
    pub info: Value,
}

/// Candle intervals offered by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    Minutes1,
    Minutes5,
    Minutes15,
    Minutes30,
    Hours1,
    Hours2,
    Hours6,
    Hours12,
    Days1,
    Days3,
    Weeks1,
}

impl KlineInterval {
    /// Length of the interval in minutes, which is how the exchange names periods
    pub fn to_minutes(&self) -> u32 {
        match self {
            Self::Minutes1 => 1,
            Self::Minutes5 => 5,
            Self::Minutes15 => 15,
            Self::Minutes30 => 30,
            Self::Hours1 => 60,
            Self::Hours2 => 120,
            Self::Hours6 => 360,
            Self::Hours12 => 720,
            Self::Days1 => 1440,
            Self::Days3 => 4320,
            Self::Weeks1 => 10080,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minutes1 => "1m",
            Self::Minutes5 => "5m",
            Self::Minutes15 => "15m",
            Self::Minutes30 => "30m",
            Self::Hours1 => "1h",
            Self::Hours2 => "2h",
            Self::Hours6 => "6h",
            Self::Hours12 => "12h",
            Self::Days1 => "1d",
            Self::Days3 => "3d",
            Self::Weeks1 => "1w",
        }
    }

    /// Get all supported intervals
    pub fn all() -> Vec<Self> {
        vec![
            Self::Minutes1,
            Self::Minutes5,
            Self::Minutes15,
            Self::Minutes30,
            Self::Hours1,
            Self::Hours2,
            Self::Hours6,
            Self::Hours12,
            Self::Days1,
            Self::Days3,
            Self::Weeks1,
        ]
    }
}

impl FromStr for KlineInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("unsupported timeframe '{}'", s))
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Self::Minutes1 => "1 minute",
            Self::Minutes5 => "5 minutes",
            Self::Minutes15 => "15 minutes",
            Self::Minutes30 => "30 minutes",
            Self::Hours1 => "1 hour",
            Self::Hours2 => "2 hours",
            Self::Hours6 => "6 hours",
            Self::Hours12 => "12 hours",
            Self::Days1 => "1 day",
            Self::Days3 => "3 days",
            Self::Weeks1 => "1 week",
        };
        write!(f, "{}", description)
    }
}

/// Unified order request handed to `create_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub amount: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    pub fn limit(symbol: impl Into<String>, side: OrderSide, amount: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            amount,
            price: Some(price),
            stop_price: None,
            client_order_id: None,
        }
    }

    pub fn market(symbol: impl Into<String>, side: OrderSide, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            side,
            amount,
            price: None,
            stop_price: None,
            client_order_id: None,
        }
    }

    #[must_use]
    pub fn with_stop_price(mut self, stop_price: f64) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    #[must_use]
    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }
}
