use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::config::AggregationConfig;
use crate::domain::{AccountBalance, AccountId, reduce_balance};
use crate::storage::{CustomerDirectory, TransactionBucketSource};

use super::AppError;

/// Computes one net balance per account listed on a customer.
///
/// Bucket fetches for all accounts run concurrently and are joined before
/// returning. Results follow the customer's account order, duplicates
/// included. Any failed or timed out fetch fails the whole call.
pub struct BalanceAggregator {
    directory: Arc<dyn CustomerDirectory>,
    source: Arc<dyn TransactionBucketSource>,
    fetch_timeout: Duration,
}

impl BalanceAggregator {
    pub fn new(
        directory: Arc<dyn CustomerDirectory>,
        source: Arc<dyn TransactionBucketSource>,
    ) -> Self {
        Self {
            directory,
            source,
            fetch_timeout: AggregationConfig::default().fetch_timeout(),
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Balances for every account of `username`, in the customer's account
    /// order. An unknown customer yields an empty list.
    #[tracing::instrument(skip(self), name = "aggregate_balances")]
    pub async fn aggregate(&self, username: &str) -> Result<Vec<AccountBalance>, AppError> {
        let customer = self
            .directory
            .lookup(username)
            .await
            .with_context(|| format!("Failed to look up customer {}", username))?;

        let Some(customer) = customer else {
            debug!("Customer not found, returning no balances");
            return Ok(Vec::new());
        };

        let balances = try_join_all(
            customer
                .accounts
                .iter()
                .map(|&account_id| self.account_balance(account_id)),
        )
        .await?;

        info!(accounts = balances.len(), "Aggregated account balances");
        Ok(balances)
    }

    async fn account_balance(&self, account_id: AccountId) -> Result<AccountBalance, AppError> {
        let buckets = tokio::time::timeout(self.fetch_timeout, self.source.fetch(account_id))
            .await
            .map_err(|_| AppError::FetchTimeout {
                account_id,
                timeout: self.fetch_timeout,
            })?
            .with_context(|| {
                format!(
                    "Failed to fetch transaction buckets for account {}",
                    account_id
                )
            })?;

        let transactions = || buckets.iter().flat_map(|bucket| &bucket.transactions);

        let degraded = transactions().filter(|t| !t.issues().is_empty()).count();
        if degraded > 0 {
            debug!(
                account_id,
                degraded, "Transactions with missing amount or code counted by default rules"
            );
        }

        Ok(AccountBalance::new(account_id, reduce_balance(transactions())))
    }
}
