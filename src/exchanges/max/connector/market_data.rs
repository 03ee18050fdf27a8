use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestParams, RestClient};
use crate::core::traits::MarketDataSource;
use crate::core::types::{Currency, KlineInterval, Market, Ohlcv, OrderBook, Ticker, Trade};
use crate::exchanges::max::connector::MaxContext;
use crate::exchanges::max::conversions::{
    filter_by_since_limit, parse_ohlcvs, parse_order_book, parse_ticker, parse_tickers,
    parse_trades,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Market data operations for MAX
pub struct MarketData<R: RestClient> {
    context: Arc<MaxContext<R>>,
}

impl<R: RestClient> MarketData<R> {
    pub fn new(context: Arc<MaxContext<R>>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for MarketData<R> {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        self.context.fetch_currencies().await
    }

    /// Get all available markets/trading pairs
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        self.context.fetch_markets().await
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let raw = self.context.rest.get_ticker(&market.id).await?;
        Ok(parse_ticker(&raw, Some(market)))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<String, Ticker>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let raw = self.context.rest.get_tickers().await?;
        Ok(parse_tickers(&raw, &tables, symbols))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let params = RequestParams::new()
            .with("market", market.id.as_str())
            .with_opt("limit", limit);
        let raw = self.context.rest.get_depth(params).await?;
        Ok(parse_order_book(&raw, Some(market.symbol.clone())))
    }

    /// Get historical candles; `since` is in milliseconds
    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: KlineInterval,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let params = RequestParams::new()
            .with("market", market.id.as_str())
            .with("period", interval.to_minutes())
            .with_opt("timestamp", since.map(|ms| ms / 1000))
            .with_opt("limit", limit);
        let raw = self.context.rest.get_klines(params).await?;
        Ok(filter_by_since_limit(parse_ohlcvs(&raw), since, limit, |c| {
            Some(c.timestamp)
        }))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let params = RequestParams::new()
            .with("market", market.id.as_str())
            .with_opt("limit", limit);
        let raw = self.context.rest.get_trades(params).await?;
        let trades = parse_trades(&raw, Some(market), &tables);
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }
}
