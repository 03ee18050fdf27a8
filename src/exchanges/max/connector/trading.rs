use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestParams, RestClient};
use crate::core::traits::OrderPlacer;
use crate::core::types::{Order, OrderRequest, Trade};
use crate::exchanges::max::connector::MaxContext;
use crate::exchanges::max::conversions::{
    amount_to_precision, filter_by_since_limit, parse_order, parse_orders, parse_trades,
    price_to_precision,
};
use crate::exchanges::max::types::{MaxOrderRequest, CLOSED_ORDER_STATES, OPEN_ORDER_STATES};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Trading implementation for MAX
pub struct Trading<R: RestClient> {
    context: Arc<MaxContext<R>>,
}

/// Numeric ids go out as JSON numbers, anything else as a string
fn order_id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map_or_else(|_| Value::from(id), Value::from)
}

fn require_symbol<'a>(symbol: Option<&'a str>, operation: &str) -> Result<&'a str, ExchangeError> {
    symbol.ok_or_else(|| {
        ExchangeError::ArgumentsRequired(format!(
            "max {} requires a symbol argument",
            operation
        ))
    })
}

impl<R: RestClient> Trading<R> {
    pub fn new(context: Arc<MaxContext<R>>) -> Self {
        Self { context }
    }

    async fn fetch_orders_in_states(
        &self,
        symbol: &str,
        states: Option<&[&str]>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let mut params = RequestParams::new()
            .with("market", market.id.as_str())
            .with_opt("limit", limit);
        if let Some(states) = states {
            params = params.with_list("state", states.iter().copied());
        }

        let raw = self.context.rest.get_orders(params).await?;
        let orders = parse_orders(&raw, Some(market), &tables);
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for Trading<R> {
    #[instrument(skip(self), fields(exchange = "max", symbol = %order.symbol))]
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(&order.symbol)?;

        let price = if order.order_type.requires_price() {
            let price = order.price.ok_or_else(|| {
                ExchangeError::InvalidOrder(format!(
                    "max create_order requires a price argument for a {} order",
                    order.order_type
                ))
            })?;
            Some(price_to_precision(price, market.precision.price)?)
        } else {
            None
        };

        let stop_price = if order.order_type.requires_stop_price() {
            let stop_price = order.stop_price.ok_or_else(|| {
                ExchangeError::InvalidOrder(format!(
                    "max create_order requires a stop price for a {} order",
                    order.order_type
                ))
            })?;
            Some(price_to_precision(stop_price, market.precision.price)?)
        } else {
            None
        };

        let request = MaxOrderRequest {
            market: market.id.clone(),
            side: order.side.as_str().to_string(),
            volume: amount_to_precision(order.amount, market.precision.amount)?,
            ord_type: order.order_type.as_str().to_string(),
            price,
            stop_price,
            client_oid: order.client_order_id.clone(),
        };

        let raw = self.context.rest.create_order(request.to_params()?).await?;
        Ok(parse_order(&raw, Some(market), &tables))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = symbol.map(|s| tables.market(s)).transpose()?;
        let params = RequestParams::new().with("id", order_id_value(id));
        let raw = self.context.rest.cancel_order(params).await?;
        Ok(parse_order(&raw, market, &tables))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let market = symbol.map(|s| tables.market(s)).transpose()?;
        let params = RequestParams::new().with_opt("market", market.map(|m| m.id.as_str()));
        let raw = self.context.rest.cancel_orders(params).await?;
        Ok(parse_orders(&raw, market, &tables))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        if id.is_empty() {
            return Err(ExchangeError::ArgumentsRequired(
                "max fetch_order requires an id argument".to_string(),
            ));
        }
        let tables = self.context.load_markets(false).await?;
        let market = symbol.map(|s| tables.market(s)).transpose()?;
        let params = RequestParams::new().with("id", order_id_value(id));
        let raw = self.context.rest.get_order(params).await?;
        Ok(parse_order(&raw, market, &tables))
    }

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let symbol = require_symbol(symbol, "fetch_orders")?;
        self.fetch_orders_in_states(symbol, None, since, limit).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let symbol = require_symbol(symbol, "fetch_open_orders")?;
        self.fetch_orders_in_states(symbol, Some(&OPEN_ORDER_STATES[..]), since, limit)
            .await
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let symbol = require_symbol(symbol, "fetch_closed_orders")?;
        self.fetch_orders_in_states(symbol, Some(&CLOSED_ORDER_STATES[..]), since, limit)
            .await
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let symbol = require_symbol(symbol, "fetch_my_trades")?;
        let tables = self.context.load_markets(false).await?;
        let market = tables.market(symbol)?;
        let params = RequestParams::new()
            .with("market", market.id.as_str())
            .with_opt("limit", limit);
        let raw = self.context.rest.get_my_trades(params).await?;
        let trades = parse_trades(&raw, Some(market), &tables);
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }
}
