use crate::core::accessors::{
    iso8601, safe_float, safe_integer, safe_string, safe_timestamp, safe_value, seconds_to_millis,
    value_to_f64,
};
use crate::core::errors::ExchangeError;
use crate::core::types::{
    Balance, Balances, Currency, CurrencyLimits, DepositAddress, Fee, FundingFees, Market,
    MarketLimits, MarketPrecision, MinMax, Ohlcv, Order, OrderBook, OrderBookEntry, OrderSide,
    OrderStatus, OrderType, TakerOrMaker, Ticker, Trade, Transaction, TransactionStatus,
    TransactionType,
};
use crate::exchanges::max::reference::ReferenceTables;
use crate::exchanges::max::rest::EXCHANGE_ID;
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Uppercase a raw currency id and resolve legacy aliases
pub fn common_currency_code(id: &str) -> String {
    let code = id.to_uppercase();
    match code.as_str() {
        "XBT" => "BTC".to_string(),
        "BCC" | "BCHABC" => "BCH".to_string(),
        "DRK" => "DASH".to_string(),
        "BCHSV" => "BSV".to_string(),
        _ => code,
    }
}

/// Exchange `bid`/`ask` to unified `buy`/`sell`; everything else passes through
pub fn parse_side(raw: &str) -> OrderSide {
    match raw {
        "bid" | "buy" => OrderSide::Buy,
        "ask" | "sell" => OrderSide::Sell,
        "self-trade" => OrderSide::SelfTrade,
        other => OrderSide::Other(other.to_string()),
    }
}

pub fn parse_order_status(raw: &str) -> OrderStatus {
    match raw {
        "wait" | "convert" | "finalizing" => OrderStatus::Open,
        "done" => OrderStatus::Closed,
        "cancel" | "failed" => OrderStatus::Canceled,
        other => OrderStatus::Other(other.to_string()),
    }
}

pub fn parse_deposit_status(raw: &str) -> TransactionStatus {
    match raw {
        "submitting" | "submitted" | "checking" | "suspect" | "suspended" => {
            TransactionStatus::Pending
        }
        "accepted" => TransactionStatus::Ok,
        "rejected" | "refunded" => TransactionStatus::Failed,
        "cancelled" | "canceled" => TransactionStatus::Canceled,
        other => TransactionStatus::Other(other.to_string()),
    }
}

pub fn parse_withdrawal_status(raw: &str) -> TransactionStatus {
    match raw {
        "submitting" | "submitted" | "pending" | "processing" | "approved" | "retryable"
        | "delisted_processing" | "sent" => TransactionStatus::Pending,
        s if s.starts_with("kgi_") => TransactionStatus::Pending,
        "confirmed" => TransactionStatus::Ok,
        "rejected" | "failed" => TransactionStatus::Failed,
        "canceled" | "cancelled" => TransactionStatus::Canceled,
        other => TransactionStatus::Other(other.to_string()),
    }
}

pub fn parse_transaction_status(raw: &str, transaction_type: TransactionType) -> TransactionStatus {
    match transaction_type {
        TransactionType::Deposit => parse_deposit_status(raw),
        TransactionType::Withdrawal => parse_withdrawal_status(raw),
    }
}

fn as_list(raw: &Value) -> &[Value] {
    raw.as_array().map_or(&[], Vec::as_slice)
}

fn precision_digits(raw: &Value, key: &str) -> Option<u32> {
    safe_integer(raw, key).and_then(|p| u32::try_from(p).ok())
}

pub fn parse_currency(raw: &Value, withdrawal: Option<&Value>) -> Option<Currency> {
    let id = safe_string(raw, "id")?;
    let code = common_currency_code(&id);
    let withdrawal = withdrawal.unwrap_or(&Value::Null);

    Some(Currency {
        fiat: id == "twd",
        name: code.clone(),
        active: true,
        precision: safe_integer(raw, "precision"),
        limits: CurrencyLimits {
            withdraw: MinMax::min(safe_float(withdrawal, "min_amount")),
            ..CurrencyLimits::default()
        },
        funding: FundingFees {
            withdraw_fee: safe_float(withdrawal, "fee"),
            deposit_fee: None,
        },
        info: raw.clone(),
        id,
        code,
    })
}

/// Join `currencies` with `withdrawal/constraint` on currency id
pub fn parse_currencies(currencies: &Value, constraints: &Value) -> Vec<Currency> {
    let by_currency: HashMap<String, &Value> = as_list(constraints)
        .iter()
        .filter_map(|c| safe_string(c, "currency").map(|id| (id, c)))
        .collect();

    as_list(currencies)
        .iter()
        .filter_map(|raw| {
            let withdrawal = safe_string(raw, "id").and_then(|id| by_currency.get(&id).copied());
            let parsed = parse_currency(raw, withdrawal);
            if parsed.is_none() {
                warn!(record = %raw, "skipping currency without id");
            }
            parsed
        })
        .collect()
}

pub fn parse_market(raw: &Value) -> Option<Market> {
    let id = safe_string(raw, "id")?;
    let base_id = safe_string(raw, "base_unit")?;
    let quote_id = safe_string(raw, "quote_unit")?;
    let base = common_currency_code(&base_id);
    let quote = common_currency_code(&quote_id);

    Some(Market {
        symbol: format!("{}/{}", base, quote),
        active: true,
        precision: MarketPrecision {
            amount: precision_digits(raw, "base_unit_precision"),
            price: precision_digits(raw, "quote_unit_precision"),
        },
        limits: MarketLimits {
            amount: MinMax::min(safe_float(raw, "min_base_amount")),
            price: MinMax::default(),
            cost: MinMax::min(safe_float(raw, "min_quote_amount")),
        },
        info: raw.clone(),
        id,
        base,
        quote,
        base_id,
        quote_id,
    })
}

pub fn parse_markets(raw: &Value) -> Vec<Market> {
    as_list(raw)
        .iter()
        .filter_map(|record| {
            let parsed = parse_market(record);
            if parsed.is_none() {
                warn!(record = %record, "skipping malformed market");
            }
            parsed
        })
        .collect()
}

pub fn parse_ticker(raw: &Value, market: Option<&Market>) -> Ticker {
    let timestamp = safe_timestamp(raw, "at");
    let last = safe_float(raw, "last");
    let open = safe_float(raw, "open");

    let (change, percentage, average) = match (last, open) {
        (Some(last), Some(open)) => {
            let change = last - open;
            let percentage = (open != 0.0).then(|| change / open * 100.0);
            (Some(change), percentage, Some((last + open) / 2.0))
        }
        _ => (None, None, None),
    };

    Ticker {
        symbol: market.map(|m| m.symbol.clone()),
        timestamp,
        datetime: iso8601(timestamp),
        high: safe_float(raw, "high"),
        low: safe_float(raw, "low"),
        bid: safe_float(raw, "buy"),
        ask: safe_float(raw, "sell"),
        open,
        close: last,
        last,
        change,
        percentage,
        average,
        base_volume: safe_float(raw, "vol"),
        quote_volume: None,
        info: raw.clone(),
    }
}

/// Tickers arrive as an object keyed by raw market id; ids that resolve to
/// no known market are dropped
pub fn parse_tickers(
    raw: &Value,
    tables: &ReferenceTables,
    symbols: Option<&[String]>,
) -> BTreeMap<String, Ticker> {
    let Some(entries) = raw.as_object() else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(market_id, record)| {
            let market = tables.market_by_id(market_id)?;
            Some((market.symbol.clone(), parse_ticker(record, Some(market))))
        })
        .filter(|(symbol, _)| symbols.map_or(true, |wanted| wanted.contains(symbol)))
        .collect()
}

fn parse_book_side(raw: Option<&Value>) -> Vec<OrderBookEntry> {
    let entries = raw.map_or(&[][..], as_list);
    entries
        .iter()
        .filter_map(|entry| {
            let pair = entry.as_array().filter(|pair| pair.len() >= 2);
            let parsed = pair.and_then(|pair| {
                Some(OrderBookEntry {
                    price: value_to_f64(&pair[0])?,
                    amount: value_to_f64(&pair[1])?,
                })
            });
            if parsed.is_none() {
                warn!(entry = %entry, "skipping malformed order book entry");
            }
            parsed
        })
        .collect()
}

pub fn parse_order_book(raw: &Value, symbol: Option<String>) -> OrderBook {
    let timestamp = safe_timestamp(raw, "timestamp");

    let mut bids = parse_book_side(raw.get("bids"));
    let mut asks = parse_book_side(raw.get("asks"));
    bids.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal));
    asks.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

    OrderBook {
        symbol,
        timestamp,
        datetime: iso8601(timestamp),
        bids,
        asks,
    }
}

/// `[ts_seconds, open, high, low, close, volume]`
pub fn parse_ohlcv(raw: &Value) -> Option<Ohlcv> {
    let row = raw.as_array()?;
    let timestamp = row.first().and_then(value_to_f64).map(seconds_to_millis)?;
    let field = |i: usize| row.get(i).and_then(value_to_f64);

    Some(Ohlcv {
        timestamp,
        open: field(1),
        high: field(2),
        low: field(3),
        close: field(4),
        volume: field(5),
    })
}

pub fn parse_ohlcvs(raw: &Value) -> Vec<Ohlcv> {
    as_list(raw).iter().filter_map(parse_ohlcv).collect()
}

fn resolve_market<'a>(
    raw: &Value,
    market: Option<&'a Market>,
    tables: &'a ReferenceTables,
) -> Option<&'a Market> {
    market.or_else(|| {
        safe_string(raw, "market").and_then(|id| tables.market_by_id(&id))
    })
}

fn created_at(raw: &Value) -> Option<i64> {
    safe_integer(raw, "created_at_in_ms").or_else(|| safe_timestamp(raw, "created_at"))
}

pub fn parse_trade(raw: &Value, market: Option<&Market>, tables: &ReferenceTables) -> Trade {
    let timestamp = created_at(raw);
    let price = safe_float(raw, "price");
    let amount = safe_float(raw, "volume");
    let side = safe_string(raw, "side").map(|s| parse_side(&s));

    let cost = safe_float(raw, "funds").or_else(|| Some(price? * amount?));

    let maker_side = safe_string(raw, "maker")
        .or_else(|| raw.get("info").and_then(|info| safe_string(info, "maker")))
        .map(|s| parse_side(&s));
    let taker_or_maker = match (&side, &maker_side) {
        (Some(side), Some(maker)) if side == maker => Some(TakerOrMaker::Maker),
        (Some(_), Some(_)) => Some(TakerOrMaker::Taker),
        _ => None,
    };

    let fee = safe_value(raw, "fee").map(|_| Fee {
        cost: safe_float(raw, "fee"),
        currency: safe_string(raw, "fee_currency").map(|id| tables.currency_code(&id)),
    });

    Trade {
        id: safe_string(raw, "id"),
        order: safe_string(raw, "order_id"),
        timestamp,
        datetime: iso8601(timestamp),
        symbol: resolve_market(raw, market, tables).map(|m| m.symbol.clone()),
        side,
        taker_or_maker,
        price,
        amount,
        cost,
        fee,
        info: raw.clone(),
    }
}

pub fn parse_trades(raw: &Value, market: Option<&Market>, tables: &ReferenceTables) -> Vec<Trade> {
    as_list(raw)
        .iter()
        .map(|record| parse_trade(record, market, tables))
        .collect()
}

pub fn parse_order(raw: &Value, market: Option<&Market>, tables: &ReferenceTables) -> Order {
    let timestamp = created_at(raw);
    let order_type = safe_string(raw, "ord_type").map(|t| OrderType::from(t.as_str()));
    let average = safe_float(raw, "avg_price");
    let amount = safe_float(raw, "volume");
    let filled = safe_float(raw, "executed_volume");

    let mut price = safe_float(raw, "price");
    if order_type == Some(OrderType::Market) && price.is_none() {
        price = average;
    }
    let cost = price.zip(filled).map(|(price, filled)| price * filled);
    let remaining = safe_float(raw, "remaining_volume")
        .or_else(|| amount.zip(filled).map(|(amount, filled)| amount - filled));

    Order {
        id: safe_string(raw, "id"),
        client_order_id: safe_string(raw, "client_oid"),
        timestamp,
        datetime: iso8601(timestamp),
        last_trade_timestamp: safe_timestamp(raw, "updated_at"),
        symbol: resolve_market(raw, market, tables).map(|m| m.symbol.clone()),
        order_type,
        side: safe_string(raw, "side").map(|s| parse_side(&s)),
        price,
        stop_price: safe_float(raw, "stop_price"),
        amount,
        filled,
        remaining,
        average,
        cost,
        status: safe_string(raw, "state").map(|s| parse_order_status(&s)),
        trades_count: safe_integer(raw, "trades_count"),
        info: raw.clone(),
    }
}

pub fn parse_orders(raw: &Value, market: Option<&Market>, tables: &ReferenceTables) -> Vec<Order> {
    as_list(raw)
        .iter()
        .map(|record| parse_order(record, market, tables))
        .collect()
}

pub fn parse_transaction(
    raw: &Value,
    transaction_type: TransactionType,
    tables: &ReferenceTables,
) -> Transaction {
    let timestamp = safe_timestamp(raw, "created_at");
    let currency = safe_string(raw, "currency").map(|id| tables.currency_code(&id));
    let fee_currency = safe_string(raw, "fee_currency")
        .map(|id| tables.currency_code(&id))
        .or_else(|| currency.clone());

    Transaction {
        id: safe_string(raw, "uuid"),
        txid: safe_string(raw, "txid"),
        timestamp,
        datetime: iso8601(timestamp),
        updated: safe_timestamp(raw, "updated_at"),
        transaction_type,
        currency,
        amount: safe_float(raw, "amount"),
        address: safe_string(raw, ["address", "to_address"]),
        status: safe_string(raw, "state").map(|s| parse_transaction_status(&s, transaction_type)),
        fee: Fee {
            cost: safe_float(raw, "fee"),
            currency: fee_currency,
        },
        info: raw.clone(),
    }
}

pub fn parse_transactions(
    raw: &Value,
    transaction_type: TransactionType,
    tables: &ReferenceTables,
) -> Vec<Transaction> {
    as_list(raw)
        .iter()
        .map(|record| parse_transaction(record, transaction_type, tables))
        .collect()
}

/// `members/accounts` rows: `balance` is free, `locked` is used
pub fn parse_balance(raw: &Value, tables: &ReferenceTables) -> Balances {
    let balances = as_list(raw)
        .iter()
        .filter_map(|row| {
            let code = tables.currency_code(&safe_string(row, "currency")?);
            let free = safe_float(row, "balance").unwrap_or(0.0);
            let used = safe_float(row, "locked").unwrap_or(0.0);
            Some((code, Balance::new(free, used)))
        })
        .collect();

    Balances {
        balances,
        info: raw.clone(),
    }
}

pub fn parse_deposit_address(code: &str, raw: &Value) -> Result<DepositAddress, ExchangeError> {
    let entry = match raw {
        Value::Array(entries) => entries.first().unwrap_or(&Value::Null),
        other => other,
    };

    let mut address = safe_string(entry, "address");
    let mut tag = None;
    if code == "XRP" {
        if let Some((addr, dt)) = address.as_deref().and_then(|a| a.split_once("?dt=")) {
            tag = Some(dt.to_string());
            address = Some(addr.to_string());
        }
    }

    let address = address
        .filter(|a| !a.trim().is_empty() && !a.contains(char::is_whitespace))
        .ok_or_else(|| {
            ExchangeError::InvalidAddress(format!(
                "{} address is invalid or missing for {}",
                EXCHANGE_ID, code
            ))
        })?;

    Ok(DepositAddress {
        currency: code.to_string(),
        address,
        tag,
        info: raw.clone(),
    })
}

fn to_decimal(value: f64, what: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_f64(value)
        .filter(|d| d.is_sign_positive() && !d.is_zero())
        .ok_or_else(|| {
            ExchangeError::InvalidOrder(format!("{} invalid {}: {}", EXCHANGE_ID, what, value))
        })
}

/// Truncate an order amount to the market's amount precision
pub fn amount_to_precision(amount: f64, precision: Option<u32>) -> Result<String, ExchangeError> {
    let mut amount_dec = to_decimal(amount, "amount")?;
    if let Some(dp) = precision {
        amount_dec = amount_dec.round_dp_with_strategy(dp, RoundingStrategy::ToZero);
    }
    if amount_dec.is_zero() {
        return Err(ExchangeError::InvalidOrder(format!(
            "{} amount {} is below the minimum precision",
            EXCHANGE_ID, amount
        )));
    }
    Ok(amount_dec.normalize().to_string())
}

/// Round a price to the market's price precision
pub fn price_to_precision(price: f64, precision: Option<u32>) -> Result<String, ExchangeError> {
    let mut price_dec = to_decimal(price, "price")?;
    if let Some(dp) = precision {
        price_dec = price_dec.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    }
    Ok(price_dec.normalize().to_string())
}

/// Sort by timestamp, keep entries at or after `since`, then cap at `limit`.
///
/// With `since` the earliest `limit` entries are kept, without it the latest.
pub fn filter_by_since_limit<T>(
    mut items: Vec<T>,
    since: Option<i64>,
    limit: Option<u32>,
    timestamp: impl Fn(&T) -> Option<i64>,
) -> Vec<T> {
    items.sort_by_key(|item| timestamp(item));
    if let Some(since) = since {
        items.retain(|item| timestamp(item).is_some_and(|ts| ts >= since));
    }
    if let Some(limit) = limit.map(|l| l as usize) {
        if items.len() > limit {
            if since.is_some() {
                items.truncate(limit);
            } else {
                let excess = items.len() - limit;
                items.drain(..excess);
            }
        }
    }
    items
}
