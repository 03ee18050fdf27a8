use crate::core::{
    errors::ExchangeError,
    types::{
        Balances, Currency, DepositAddress, KlineInterval, Market, Ohlcv, Order, OrderBook,
        OrderRequest, Ticker, Trade, Transaction,
    },
};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait MarketDataSource {
    /// Get all listed currencies with their funding limits
    async fn fetch_currencies(&self) -> Result<Vec<Currency>, ExchangeError>;

    /// Get all available markets/trading pairs
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError>;

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    /// Get tickers keyed by unified symbol, optionally restricted to `symbols`
    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<String, Ticker>, ExchangeError>;

    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError>;

    /// Get historical candles
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: KlineInterval,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError>;

    /// Get recent public trades
    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError>;
}

#[async_trait]
pub trait OrderPlacer {
    /// Place a new order
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError>;

    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError>;

    /// Cancel every open order, or only those of `symbol`
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError>;

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    /// Get the account's own fills
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError>;
}

#[async_trait]
pub trait AccountInfo {
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError>;

    async fn create_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError>;

    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError>;

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError>;

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError>;
}

// Composite trait for callers that need the whole surface
#[async_trait]
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo {}
