use crate::core::errors::ExchangeError;
use crate::core::types::{Currency, Market};
use crate::exchanges::max::conversions::common_currency_code;
use crate::exchanges::max::rest::EXCHANGE_ID;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::debug;

/// Market and currency lookup maps, keyed both by unified name and by raw exchange id
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub markets: BTreeMap<String, Market>,
    pub markets_by_id: HashMap<String, Market>,
    pub currencies: BTreeMap<String, Currency>,
    pub currencies_by_id: HashMap<String, Currency>,
}

impl ReferenceTables {
    pub fn new(markets: Vec<Market>, currencies: Vec<Currency>) -> Self {
        let markets_by_id = markets
            .iter()
            .map(|m| (m.id.clone(), m.clone()))
            .collect();
        let currencies_by_id = currencies
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        Self {
            markets: markets.into_iter().map(|m| (m.symbol.clone(), m)).collect(),
            markets_by_id,
            currencies: currencies.into_iter().map(|c| (c.code.clone(), c)).collect(),
            currencies_by_id,
        }
    }

    pub fn market(&self, symbol: &str) -> Result<&Market, ExchangeError> {
        self.markets.get(symbol).ok_or_else(|| {
            ExchangeError::BadSymbol(format!(
                "{} does not have market symbol {}",
                EXCHANGE_ID, symbol
            ))
        })
    }

    pub fn market_by_id(&self, id: &str) -> Option<&Market> {
        self.markets_by_id.get(id)
    }

    pub fn currency(&self, code: &str) -> Result<&Currency, ExchangeError> {
        self.currencies.get(code).ok_or_else(|| {
            ExchangeError::BadSymbol(format!(
                "{} does not have currency code {}",
                EXCHANGE_ID, code
            ))
        })
    }

    /// Unified code for a raw currency id; unknown ids are uppercased and aliased
    pub fn currency_code(&self, id: &str) -> String {
        self.currencies_by_id
            .get(id)
            .map_or_else(|| common_currency_code(id), |c| c.code.clone())
    }
}

/// Process-wide reference snapshot.
///
/// Readers get an `Arc` to an immutable snapshot; a reload builds a new
/// snapshot and swaps it in whole. Concurrent first loads are coalesced
/// behind an async mutex so only one of them hits the network.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    snapshot: RwLock<Option<Arc<ReferenceTables>>>,
    loading: Mutex<()>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<ReferenceTables>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, tables: ReferenceTables) -> Arc<ReferenceTables> {
        let tables = Arc::new(tables);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(tables.clone());
        tables
    }

    /// Return the cached snapshot, running `load` when there is none or when
    /// `reload` is requested
    pub async fn get_or_load<F, Fut>(
        &self,
        reload: bool,
        load: F,
    ) -> Result<Arc<ReferenceTables>, ExchangeError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ReferenceTables, ExchangeError>> + Send,
    {
        if !reload {
            if let Some(tables) = self.current() {
                return Ok(tables);
            }
        }

        let _guard = self.loading.lock().await;
        if !reload {
            // another caller may have finished loading while we waited
            if let Some(tables) = self.current() {
                return Ok(tables);
            }
        }

        let tables = load().await?;
        debug!(
            markets = tables.markets.len(),
            currencies = tables.currencies.len(),
            "reference tables loaded"
        );
        Ok(self.replace(tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MarketLimits, MarketPrecision};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn market(id: &str, symbol: &str) -> Market {
        Market {
            id: id.to_string(),
            symbol: symbol.to_string(),
            base: symbol.split('/').next().unwrap().to_string(),
            quote: symbol.split('/').nth(1).unwrap().to_string(),
            base_id: String::new(),
            quote_id: String::new(),
            active: true,
            precision: MarketPrecision::default(),
            limits: MarketLimits::default(),
            info: Value::Null,
        }
    }

    #[test]
    fn test_lookup_by_symbol_and_id() {
        let tables = ReferenceTables::new(vec![market("btcusdt", "BTC/USDT")], vec![]);
        assert_eq!(tables.market("BTC/USDT").unwrap().id, "btcusdt");
        assert_eq!(tables.market_by_id("btcusdt").unwrap().symbol, "BTC/USDT");
        assert!(matches!(
            tables.market("ETH/USDT"),
            Err(ExchangeError::BadSymbol(_))
        ));
        assert!(matches!(tables.currency("BTC"), Err(ExchangeError::BadSymbol(_))));
    }

    #[test]
    fn test_unknown_currency_id_is_uppercased() {
        let tables = ReferenceTables::default();
        assert_eq!(tables.currency_code("usdt"), "USDT");
        assert_eq!(tables.currency_code("xbt"), "BTC");
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_are_coalesced() {
        let cache = Arc::new(ReferenceCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load(false, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(ReferenceTables::new(vec![market("btcusdt", "BTC/USDT")], vec![]))
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().markets.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot() {
        let cache = ReferenceCache::new();
        let first = cache
            .get_or_load(false, || async { Ok(ReferenceTables::default()) })
            .await
            .unwrap();
        let second = cache
            .get_or_load(true, || async {
                Ok(ReferenceTables::new(vec![market("ethtwd", "ETH/TWD")], vec![]))
            })
            .await
            .unwrap();
        assert!(first.markets.is_empty());
        assert_eq!(second.markets.len(), 1);
        assert_eq!(cache.current().unwrap().markets.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_cache_empty() {
        let cache = ReferenceCache::new();
        let err = cache
            .get_or_load(false, || async {
                Err(ExchangeError::NetworkError("down".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NetworkError(_)));
        assert!(cache.current().is_none());
    }
}
