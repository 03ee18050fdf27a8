use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestParams, RestClient};
use crate::core::traits::AccountInfo;
use crate::core::types::{Balances, DepositAddress, Transaction, TransactionType};
use crate::exchanges::max::connector::MaxContext;
use crate::exchanges::max::conversions::{
    filter_by_since_limit, parse_balance, parse_deposit_address, parse_transactions,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Account implementation for MAX
pub struct Account<R: RestClient> {
    context: Arc<MaxContext<R>>,
}

impl<R: RestClient> Account<R> {
    pub fn new(context: Arc<MaxContext<R>>) -> Self {
        Self { context }
    }

    async fn fetch_transactions(
        &self,
        transaction_type: TransactionType,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let currency_id = code
            .map(|c| tables.currency(c).map(|currency| currency.id.as_str()))
            .transpose()?;
        let params = RequestParams::new()
            .with_opt("currency", currency_id)
            .with_opt("limit", limit);

        let raw = match transaction_type {
            TransactionType::Deposit => self.context.rest.get_deposits(params).await?,
            TransactionType::Withdrawal => self.context.rest.get_withdrawals(params).await?,
        };
        let transactions = parse_transactions(&raw, transaction_type, &tables);
        Ok(filter_by_since_limit(transactions, since, limit, |t| {
            t.timestamp
        }))
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for Account<R> {
    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let raw = self.context.rest.get_accounts().await?;
        Ok(parse_balance(&raw, &tables))
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn create_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let currency = tables.currency(code)?;
        let raw = self.context.rest.create_deposit_address(&currency.id).await?;
        parse_deposit_address(&currency.code, &raw)
    }

    #[instrument(skip(self), fields(exchange = "max"))]
    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        let tables = self.context.load_markets(false).await?;
        let currency = tables.currency(code)?;
        let raw = self.context.rest.get_deposit_addresses(&currency.id).await?;
        parse_deposit_address(&currency.code, &raw)
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.fetch_transactions(TransactionType::Deposit, code, since, limit)
            .await
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.fetch_transactions(TransactionType::Withdrawal, code, since, limit)
            .await
    }
}
