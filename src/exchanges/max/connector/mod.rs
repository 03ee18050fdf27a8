use crate::core::accessors::value_to_i64;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer};
use crate::core::types::{
    Balances, Currency, DepositAddress, KlineInterval, Market, Ohlcv, Order, OrderBook,
    OrderRequest, Ticker, Trade, Transaction,
};
use crate::exchanges::max::conversions::{parse_currencies, parse_markets};
use crate::exchanges::max::reference::{ReferenceCache, ReferenceTables};
use crate::exchanges::max::rest::MaxRest;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::Trading;

/// State shared by the market data, trading and account components
pub struct MaxContext<R: RestClient> {
    pub rest: MaxRest<R>,
    pub reference: ReferenceCache,
    pub adjust_for_time_difference: bool,
}

impl<R: RestClient> MaxContext<R> {
    pub fn new(rest: MaxRest<R>, adjust_for_time_difference: bool) -> Self {
        Self {
            rest,
            reference: ReferenceCache::new(),
            adjust_for_time_difference,
        }
    }

    /// Measure `local - server` clock difference and use it for every later nonce
    #[instrument(skip(self), fields(exchange = "max"))]
    pub async fn resync_time(&self) -> Result<i64, ExchangeError> {
        let response = self.rest.get_timestamp().await?;
        let server_seconds = value_to_i64(&response).ok_or_else(|| {
            ExchangeError::DeserializationError(format!(
                "max timestamp response is not a number: {}",
                response
            ))
        })?;

        let offset = server_seconds
            .checked_mul(1000)
            .and_then(|server_ms| self.rest.nonce().now_millis().checked_sub(server_ms))
            .ok_or_else(|| {
                ExchangeError::DeserializationError(format!(
                    "max timestamp response is out of range: {}",
                    server_seconds
                ))
            })?;
        self.rest.nonce().offset().set(offset);
        debug!(offset, "clock offset resynced");
        Ok(offset)
    }

    pub async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        if self.adjust_for_time_difference {
            self.resync_time().await?;
        }
        let raw = self.rest.get_markets().await?;
        Ok(parse_markets(&raw))
    }

    pub async fn fetch_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        let currencies = self.rest.get_currencies().await?;
        let constraints = self.rest.get_withdrawal_constraints().await?;
        Ok(parse_currencies(&currencies, &constraints))
    }

    /// Current reference snapshot, loading it on first use or when `reload` is set
    pub async fn load_markets(&self, reload: bool) -> Result<Arc<ReferenceTables>, ExchangeError> {
        self.reference
            .get_or_load(reload, || async {
                let markets = self.fetch_markets().await?;
                let currencies = self.fetch_currencies().await?;
                Ok(ReferenceTables::new(markets, currencies))
            })
            .await
    }
}

/// MAX connector that composes all sub-trait implementations
pub struct MaxConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
    context: Arc<MaxContext<R>>,
}

impl<R: RestClient> MaxConnector<R> {
    pub fn new(context: MaxContext<R>) -> Self {
        let context = Arc::new(context);
        Self {
            market: MarketData::new(context.clone()),
            trading: Trading::new(context.clone()),
            account: Account::new(context.clone()),
            context,
        }
    }

    pub async fn load_markets(&self, reload: bool) -> Result<Arc<ReferenceTables>, ExchangeError> {
        self.context.load_markets(reload).await
    }

    pub async fn resync_time(&self) -> Result<i64, ExchangeError> {
        self.context.resync_time().await
    }

    /// Offset currently applied to nonces, in milliseconds
    pub fn time_offset(&self) -> i64 {
        self.context.rest.nonce().offset().get()
    }

    pub fn has_credentials(&self) -> bool {
        self.context.rest.has_credentials()
    }
}

// Implement traits for the connector by delegating to sub-components
#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for MaxConnector<R> {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        self.market.fetch_currencies().await
    }

    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        self.market.fetch_markets().await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        self.market.fetch_ticker(symbol).await
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<String, Ticker>, ExchangeError> {
        self.market.fetch_tickers(symbols).await
    }

    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        self.market.fetch_order_book(symbol, limit).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: KlineInterval,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        self.market.fetch_ohlcv(symbol, interval, since, limit).await
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.market.fetch_trades(symbol, since, limit).await
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for MaxConnector<R> {
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError> {
        self.trading.create_order(order).await
    }

    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.trading.cancel_order(id, symbol).await
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        self.trading.cancel_all_orders(symbol).await
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.trading.fetch_order(id, symbol).await
    }

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.trading.fetch_orders(symbol, since, limit).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.trading.fetch_open_orders(symbol, since, limit).await
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.trading.fetch_closed_orders(symbol, since, limit).await
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.trading.fetch_my_trades(symbol, since, limit).await
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for MaxConnector<R> {
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        self.account.fetch_balance().await
    }

    async fn create_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        self.account.create_deposit_address(code).await
    }

    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        self.account.fetch_deposit_address(code).await
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.account.fetch_deposits(code, since, limit).await
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.account.fetch_withdrawals(code, since, limit).await
    }
}

impl<R: RestClient + 'static> ExchangeConnector for MaxConnector<R> {}
