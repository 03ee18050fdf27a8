use async_trait::async_trait;
use maxx::core::config::ExchangeConfig;
use maxx::core::errors::ExchangeError;
use maxx::core::kernel::{Clock, HttpRequest, HttpResponse, RestClient};
use maxx::core::traits::{AccountInfo, MarketDataSource, OrderPlacer};
use maxx::core::types::{
    KlineInterval, OrderRequest, OrderSide, OrderStatus, OrderType, TransactionStatus,
};
use maxx::{MaxBuilder, MaxConnector};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const NOW_MS: i64 = 1_700_000_000_500;

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Transport that answers by endpoint path and records every request
#[derive(Default)]
struct MockRest {
    routes: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

fn endpoint(url: &str) -> String {
    let path = url.split('?').next().unwrap_or_default();
    path.split("/api/v2/").nth(1).unwrap_or_default().to_string()
}

impl MockRest {
    fn with_reference_data() -> Arc<Self> {
        let mock = Arc::new(Self::default());
        mock.route(
            "markets",
            json!([
                {
                    "id": "btcusdt",
                    "base_unit": "btc",
                    "quote_unit": "usdt",
                    "base_unit_precision": 6,
                    "quote_unit_precision": 2,
                    "min_base_amount": 0.0004,
                    "min_quote_amount": 8.0
                },
                {
                    "id": "ethtwd",
                    "base_unit": "eth",
                    "quote_unit": "twd",
                    "base_unit_precision": 4,
                    "quote_unit_precision": 1
                }
            ]),
        );
        mock.route(
            "currencies",
            json!([
                {"id": "btc", "precision": 8},
                {"id": "usdt", "precision": 6},
                {"id": "eth", "precision": 8},
                {"id": "twd", "precision": 0}
            ]),
        );
        mock.route(
            "withdrawal/constraint",
            json!([{"currency": "btc", "fee": 0.0005, "min_amount": 0.001}]),
        );
        mock.route("timestamp", json!(1_700_000_000));
        mock
    }

    fn route(&self, path: &str, body: Value) {
        self.respond(path, HttpResponse::ok(body));
    }

    fn respond(&self, path: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| endpoint(&r.url) == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RestClient for MockRest {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let path = endpoint(&request.url);
        self.requests.lock().unwrap().push(request);
        self.routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or_else(|| ExchangeError::NetworkError(format!("no route for {}", path)))
    }
}

fn connector(mock: &Arc<MockRest>, config: ExchangeConfig) -> MaxConnector<Arc<MockRest>> {
    MaxBuilder::new()
        .with_config(config)
        .with_clock(Arc::new(FixedClock(NOW_MS)))
        .build_with_client(mock.clone())
}

fn private_config() -> ExchangeConfig {
    ExchangeConfig::new("test_api_key".to_string(), "test_secret_key".to_string())
}

fn body_of(request: &HttpRequest) -> Value {
    serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
}

#[cfg(test)]
mod reference_data {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        let (first, second) = tokio::join!(max.load_markets(false), max.load_markets(false));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.requests_to("markets").len(), 1);
        assert_eq!(mock.requests_to("currencies").len(), 1);
        assert_eq!(mock.requests_to("withdrawal/constraint").len(), 1);
    }

    #[tokio::test]
    async fn test_cached_until_reload() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        let first = max.load_markets(false).await.unwrap();
        let cached = max.load_markets(false).await.unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        let reloaded = max.load_markets(true).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(mock.requests_to("markets").len(), 2);
    }

    #[tokio::test]
    async fn test_tables_join_markets_and_currencies() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        let tables = max.load_markets(false).await.unwrap();
        let market = tables.market("BTC/USDT").unwrap();
        assert_eq!(market.id, "btcusdt");
        assert_eq!(tables.market_by_id("ethtwd").unwrap().symbol, "ETH/TWD");

        let btc = tables.currency("BTC").unwrap();
        assert_eq!(btc.funding.withdraw_fee, Some(0.0005));
        assert!(tables.currency("TWD").unwrap().fiat);
        assert!(matches!(
            tables.market("DOGE/USDT"),
            Err(ExchangeError::BadSymbol(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let mock = Arc::new(MockRest::default());
        let max = connector(&mock, ExchangeConfig::read_only());

        assert!(max.load_markets(false).await.is_err());

        let seeded = MockRest::with_reference_data();
        for path in ["markets", "currencies", "withdrawal/constraint"] {
            let response = seeded.routes.lock().unwrap().get(path).cloned().unwrap();
            mock.respond(path, response);
        }
        assert!(max.load_markets(false).await.is_ok());
        assert_eq!(mock.requests_to("markets").len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_markets_resyncs_when_adjusting() {
        let mock = MockRest::with_reference_data();
        let max = connector(
            &mock,
            ExchangeConfig::read_only().adjust_for_time_difference(true),
        );

        let markets = max.fetch_markets().await.unwrap();
        assert_eq!(markets.len(), 2);
        assert_eq!(mock.requests_to("timestamp").len(), 1);
        assert_eq!(max.time_offset(), 500);
    }

    #[tokio::test]
    async fn test_fetch_markets_leaves_clock_alone_by_default() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        max.fetch_markets().await.unwrap();
        assert!(mock.requests_to("timestamp").is_empty());
        assert_eq!(max.time_offset(), 0);
    }
}

#[cfg(test)]
mod market_data {
    use super::*;

    #[tokio::test]
    async fn test_fetch_ticker() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "tickers/btcusdt",
            json!({
                "at": 1_700_000_000,
                "buy": "36999.5",
                "sell": "37000.1",
                "open": "36000",
                "low": "35900",
                "high": "37100",
                "last": "37000",
                "vol": "123.45"
            }),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let ticker = max.fetch_ticker("BTC/USDT").await.unwrap();
        assert_eq!(ticker.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(ticker.timestamp, Some(1_700_000_000_000));
        assert_eq!(ticker.bid, Some(36999.5));
        assert_eq!(ticker.ask, Some(37000.1));
        assert_eq!(ticker.last, Some(37000.0));
        assert_eq!(ticker.change, Some(1000.0));
        assert_eq!(ticker.base_volume, Some(123.45));

        let request = &mock.requests_to("tickers/btcusdt")[0];
        assert!(request.headers.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ticker_unknown_symbol() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        let result = max.fetch_ticker("DOGE/USDT").await;
        assert!(matches!(result, Err(ExchangeError::BadSymbol(_))));
    }

    #[tokio::test]
    async fn test_fetch_tickers_filters_symbols() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "tickers",
            json!({
                "btcusdt": {"at": 1_700_000_000, "last": "37000"},
                "ethtwd": {"at": 1_700_000_000, "last": "60000"},
                "unlisted": {"at": 1_700_000_000, "last": "1"}
            }),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let all = max.fetch_tickers(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let symbols = vec!["ETH/TWD".to_string()];
        let some = max.fetch_tickers(Some(&symbols)).await.unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some["ETH/TWD"].last, Some(60000.0));
    }

    #[tokio::test]
    async fn test_fetch_order_book_sorted() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "depth",
            json!({
                "timestamp": 1_700_000_000,
                "bids": [["36990", "1"], ["37000", "0.5"], ["bad"]],
                "asks": [["37020", "2"], ["37010", "0.1"]]
            }),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let book = max.fetch_order_book("BTC/USDT", Some(10)).await.unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.best_bid().unwrap().price, 37000.0);
        assert_eq!(book.best_ask().unwrap().price, 37010.0);
        assert_eq!(book.timestamp, Some(1_700_000_000_000));

        let url = &mock.requests_to("depth")[0].url;
        assert!(url.ends_with("depth?limit=10&market=btcusdt"));
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_sends_minutes_and_seconds() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "k",
            json!([
                [1_699_996_400, 35500, 36100, 35400, 36000, 8.0],
                [1_700_000_000, 36000, 37100, 35900, 37000, 12.5],
                [1_700_003_600, 37000, 37200, 36900, 37100, 3.0],
                [1_700_007_200, 37100, 37300, 37000, 37250, 4.5]
            ]),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let candles = max
            .fetch_ohlcv(
                "BTC/USDT",
                KlineInterval::Hours1,
                Some(1_700_000_000_000),
                Some(2),
            )
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[1].timestamp, 1_700_003_600_000);
        assert_eq!(candles[1].close, Some(37100.0));

        let url = &mock.requests_to("k")[0].url;
        assert!(url.contains("period=60"));
        assert!(url.contains("timestamp=1700000000"));
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_applies_since_and_limit() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "k",
            json!([
                [3000, 3, 3, 3, 3, 1],
                [1000, 1, 1, 1, 1, 1],
                [2000, 2, 2, 2, 2, 1]
            ]),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let since = max
            .fetch_ohlcv("BTC/USDT", KlineInterval::Minutes1, Some(2_000_000), Some(1))
            .await
            .unwrap();
        let timestamps: Vec<i64> = since.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![2_000_000]);

        let latest = max
            .fetch_ohlcv("BTC/USDT", KlineInterval::Minutes1, None, Some(2))
            .await
            .unwrap();
        let timestamps: Vec<i64> = latest.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![2_000_000, 3_000_000]);
    }

    #[tokio::test]
    async fn test_fetch_trades_applies_since_and_limit() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "trades",
            json!([
                {"id": 3, "price": "37002", "volume": "0.1", "market": "btcusdt", "created_at_in_ms": 3000, "side": "bid"},
                {"id": 1, "price": "37000", "volume": "0.1", "market": "btcusdt", "created_at_in_ms": 1000, "side": "ask"},
                {"id": 2, "price": "37001", "volume": "0.1", "market": "btcusdt", "created_at_in_ms": 2000, "side": "bid"}
            ]),
        );
        let max = connector(&mock, ExchangeConfig::read_only());

        let trades = max
            .fetch_trades("BTC/USDT", Some(2000), Some(1))
            .await
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id.as_deref(), Some("2"));
        assert_eq!(trades[0].symbol.as_deref(), Some("BTC/USDT"));
    }
}

#[cfg(test)]
mod trading {
    use super::*;

    fn order_response() -> Value {
        json!({
            "id": 87,
            "side": "buy",
            "ord_type": "limit",
            "price": "30000.13",
            "state": "wait",
            "market": "btcusdt",
            "created_at": 1_700_000_000,
            "volume": "0.123456",
            "remaining_volume": "0.123456",
            "executed_volume": "0",
            "trades_count": 0
        })
    }

    #[tokio::test]
    async fn test_create_order_signs_and_applies_precision() {
        let mock = MockRest::with_reference_data();
        mock.route("orders", order_response());
        let max = connector(&mock, private_config());

        let order = max
            .create_order(OrderRequest::limit(
                "BTC/USDT",
                OrderSide::Buy,
                0.123_456_78,
                30000.129,
            ))
            .await
            .unwrap();
        assert_eq!(order.id.as_deref(), Some("87"));
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.order_type, Some(OrderType::Limit));

        let request = &mock.requests_to("orders")[0];
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.headers["X-MAX-ACCESSKEY"], "test_api_key");
        assert!(request.headers.contains_key("X-MAX-PAYLOAD"));
        assert!(request.headers.contains_key("X-MAX-SIGNATURE"));

        let body = body_of(request);
        assert_eq!(body["market"], "btcusdt");
        assert_eq!(body["side"], "buy");
        assert_eq!(body["ord_type"], "limit");
        assert_eq!(body["volume"], "0.123456");
        assert_eq!(body["price"], "30000.13");
        assert_eq!(body["path"], "/api/v2/orders");
        assert_eq!(body["nonce"], NOW_MS);
    }

    #[tokio::test]
    async fn test_create_stop_limit_order_body() {
        let mock = MockRest::with_reference_data();
        mock.route("orders", order_response());
        let max = connector(&mock, private_config());

        let mut request = OrderRequest::limit("BTC/USDT", OrderSide::Sell, 0.5, 29000.0)
            .with_stop_price(29500.557)
            .with_client_order_id("my-order-1");
        request.order_type = OrderType::StopLimit;
        max.create_order(request).await.unwrap();

        let body = body_of(&mock.requests_to("orders")[0]);
        assert_eq!(body["ord_type"], "stop_limit");
        assert_eq!(body["side"], "sell");
        assert_eq!(body["volume"], "0.5");
        assert_eq!(body["price"], "29000");
        assert_eq!(body["stop_price"], "29500.56");
        assert_eq!(body["client_oid"], "my-order-1");
    }

    #[tokio::test]
    async fn test_create_order_requires_price_for_limit() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, private_config());

        let mut request = OrderRequest::limit("BTC/USDT", OrderSide::Sell, 1.0, 1.0);
        request.price = None;

        let result = max.create_order(request).await;
        assert!(matches!(result, Err(ExchangeError::InvalidOrder(_))));
        assert!(mock.requests_to("orders").is_empty());
    }

    #[tokio::test]
    async fn test_create_stop_order_requires_stop_price() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, private_config());

        let mut request = OrderRequest::market("BTC/USDT", OrderSide::Sell, 1.0);
        request.order_type = OrderType::StopMarket;

        let result = max.create_order(request).await;
        assert!(matches!(result, Err(ExchangeError::InvalidOrder(_))));
    }

    #[tokio::test]
    async fn test_insufficient_funds_envelope() {
        let mock = MockRest::with_reference_data();
        mock.respond(
            "orders",
            HttpResponse {
                status: 400,
                body: json!({"error": {"code": 2018, "message": "cannot lock funds"}}),
            },
        );
        let max = connector(&mock, private_config());

        let result = max
            .create_order(OrderRequest::market("BTC/USDT", OrderSide::Buy, 1.0))
            .await;
        match result {
            Err(ExchangeError::InsufficientFunds(message)) => {
                assert_eq!(message, "max cannot lock funds");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_order_not_found_envelope() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "order",
            json!({"error": {"code": 2004, "message": "order not found"}}),
        );
        let max = connector(&mock, private_config());

        let result = max.fetch_order("42", None).await;
        assert!(matches!(result, Err(ExchangeError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_unclassified_http_failure() {
        let mock = MockRest::with_reference_data();
        mock.respond(
            "order",
            HttpResponse {
                status: 502,
                body: json!({"error": "bad gateway"}),
            },
        );
        let max = connector(&mock, private_config());

        let result = max.fetch_order("42", None).await;
        assert!(matches!(
            result,
            Err(ExchangeError::ApiError { code: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_order_sends_numeric_id() {
        let mock = MockRest::with_reference_data();
        let mut canceled = order_response();
        canceled["state"] = json!("cancel");
        mock.route("order/delete", canceled);
        let max = connector(&mock, private_config());

        let order = max.cancel_order("87", Some("BTC/USDT")).await.unwrap();
        assert_eq!(order.status, Some(OrderStatus::Canceled));

        let body = body_of(&mock.requests_to("order/delete")[0]);
        assert_eq!(body["id"], 87);
        assert_eq!(body["path"], "/api/v2/order/delete");
    }

    #[tokio::test]
    async fn test_fetch_open_orders_queries_open_states() {
        let mock = MockRest::with_reference_data();
        mock.route("orders", json!([order_response()]));
        let max = connector(&mock, private_config());

        let orders = max
            .fetch_open_orders(Some("BTC/USDT"), None, None)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].symbol.as_deref(), Some("BTC/USDT"));

        let request = &mock.requests_to("orders")[0];
        assert_eq!(request.method, reqwest::Method::GET);
        assert!(request.body.is_none());
        assert!(request
            .url
            .contains("state[]=wait&state[]=convert&state[]=finalizing"));
        assert!(request.url.contains("market=btcusdt"));
        assert!(request.url.contains("path=%2Fapi%2Fv2%2Forders"));
    }

    #[tokio::test]
    async fn test_list_queries_require_symbol() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, private_config());

        let result = max.fetch_closed_orders(None, None, None).await;
        assert!(matches!(result, Err(ExchangeError::ArgumentsRequired(_))));
        let result = max.fetch_my_trades(None, None, None).await;
        assert!(matches!(result, Err(ExchangeError::ArgumentsRequired(_))));
    }
}

#[cfg(test)]
mod account {
    use super::*;

    #[tokio::test]
    async fn test_private_calls_need_credentials() {
        let mock = MockRest::with_reference_data();
        let max = connector(&mock, ExchangeConfig::read_only());

        let result = max.fetch_balance().await;
        assert!(matches!(result, Err(ExchangeError::AuthenticationError(_))));
        assert!(mock.requests_to("members/accounts").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_balance() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "members/accounts",
            json!([
                {"currency": "btc", "balance": "1.5", "locked": "0.5"},
                {"currency": "twd", "balance": "1000", "locked": "0"}
            ]),
        );
        let max = connector(&mock, private_config());

        let balances = max.fetch_balance().await.unwrap();
        let btc = balances.get("BTC").unwrap();
        assert_eq!(btc.free, 1.5);
        assert_eq!(btc.used, 0.5);
        assert_eq!(btc.total, 2.0);
        assert_eq!(balances.get("TWD").unwrap().total, 1000.0);
    }

    #[tokio::test]
    async fn test_fetch_deposits_uses_deposit_endpoint() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "deposits",
            json!([{
                "uuid": "d-1",
                "currency": "btc",
                "amount": "0.3",
                "fee": "0",
                "txid": "0xabc",
                "state": "accepted",
                "created_at": 1_700_000_000
            }]),
        );
        let max = connector(&mock, private_config());

        let deposits = max.fetch_deposits(Some("BTC"), None, None).await.unwrap();
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].currency.as_deref(), Some("BTC"));
        assert_eq!(deposits[0].status, Some(TransactionStatus::Ok));
        assert!(mock.requests_to("withdrawals").is_empty());
        assert!(mock.requests_to("deposits")[0].url.contains("currency=btc"));
    }

    #[tokio::test]
    async fn test_fetch_withdrawals_status() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "withdrawals",
            json!([{
                "uuid": "w-1",
                "currency": "btc",
                "amount": "0.1",
                "fee": "0.0005",
                "to_address": "bc1qexample",
                "state": "kgi_manually_processing",
                "created_at": 1_700_000_000
            }]),
        );
        let max = connector(&mock, private_config());

        let withdrawals = max.fetch_withdrawals(None, None, None).await.unwrap();
        assert_eq!(withdrawals[0].status, Some(TransactionStatus::Pending));
        assert_eq!(withdrawals[0].address.as_deref(), Some("bc1qexample"));
    }

    #[tokio::test]
    async fn test_fetch_deposit_address() {
        let mock = MockRest::with_reference_data();
        mock.route(
            "deposit_addresses",
            json!([{"currency": "btc", "address": "bc1qdeposit"}]),
        );
        let max = connector(&mock, private_config());

        let address = max.fetch_deposit_address("BTC").await.unwrap();
        assert_eq!(address.currency, "BTC");
        assert_eq!(address.address, "bc1qdeposit");
        assert_eq!(address.tag, None);
    }

    #[tokio::test]
    async fn test_missing_deposit_address_is_invalid() {
        let mock = MockRest::with_reference_data();
        mock.route("deposit_addresses", json!([{"currency": "btc", "address": ""}]));
        let max = connector(&mock, private_config());

        let result = max.create_deposit_address("BTC").await;
        assert!(matches!(result, Err(ExchangeError::InvalidAddress(_))));
    }
}

#[cfg(test)]
mod clock {
    use super::*;

    #[tokio::test]
    async fn test_resync_shifts_later_nonces() {
        let mock = MockRest::with_reference_data();
        mock.route("members/accounts", json!([]));
        let max = connector(&mock, private_config());

        let offset = max.resync_time().await.unwrap();
        assert_eq!(offset, 500);
        assert_eq!(max.time_offset(), 500);

        max.fetch_balance().await.unwrap();
        let url = &mock.requests_to("members/accounts")[0].url;
        assert!(url.contains(&format!("nonce={}", NOW_MS - 500)));
    }

    #[tokio::test]
    async fn test_resync_rejects_out_of_range_time() {
        let mock = MockRest::with_reference_data();
        mock.route("timestamp", json!(i64::MAX));
        let max = connector(&mock, ExchangeConfig::read_only());

        let result = max.resync_time().await;
        assert!(matches!(
            result,
            Err(ExchangeError::DeserializationError(_))
        ));
        assert_eq!(max.time_offset(), 0);

        mock.route("timestamp", json!(i64::MIN / 10));
        assert!(max.resync_time().await.is_err());
        assert_eq!(max.time_offset(), 0);
    }

    #[tokio::test]
    async fn test_resync_rejects_non_numeric_time() {
        let mock = MockRest::with_reference_data();
        mock.route("timestamp", json!({"unexpected": true}));
        let max = connector(&mock, ExchangeConfig::read_only());

        let result = max.resync_time().await;
        assert!(matches!(
            result,
            Err(ExchangeError::DeserializationError(_))
        ));
        assert_eq!(max.time_offset(), 0);
    }
}
