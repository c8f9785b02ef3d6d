use std::sync::Arc;

use crate::config::AggregationConfig;
use crate::domain::{Account, AccountBalance, AccountId, Customer, TransactionBucket};
use crate::io::Dataset;
use crate::storage::{Repository, StoreStats};

use super::{AppError, BalanceAggregator};

/// Application service over the record store.
/// This is the primary interface for any client (CLI, tests, embedding code).
pub struct QueryService {
    repo: Arc<Repository>,
    aggregator: BalanceAggregator,
}

/// Counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub accounts: usize,
    pub customers: usize,
    pub buckets: usize,
}

impl QueryService {
    /// Create a new service over the given repository.
    pub fn new(repo: Repository, config: &AggregationConfig) -> Self {
        let repo = Arc::new(repo);
        let aggregator = BalanceAggregator::new(repo.clone(), repo.clone())
            .with_fetch_timeout(config.fetch_timeout());
        Self { repo, aggregator }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, config: &AggregationConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    /// Connect to an existing database.
    pub async fn connect(
        database_path: &str,
        config: &AggregationConfig,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    /// Release the connection pool.
    pub async fn close(self) {
        self.repo.close().await;
    }

    // ========================
    // Account queries
    // ========================

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    pub async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.repo.get_account(account_id).await?)
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, AppError> {
        self.find_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))
    }

    // ========================
    // Customer queries
    // ========================

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers().await?)
    }

    pub async fn find_customer(&self, username: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.repo.get_customer(username).await?)
    }

    pub async fn get_customer(&self, username: &str) -> Result<Customer, AppError> {
        self.find_customer(username)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(username.to_string()))
    }

    // ========================
    // Transactions and balances
    // ========================

    /// All buckets recorded for an account (empty for unknown accounts).
    pub async fn transaction_buckets(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionBucket>, AppError> {
        Ok(self.repo.list_buckets_for_account(account_id).await?)
    }

    pub async fn list_all_buckets(&self) -> Result<Vec<TransactionBucket>, AppError> {
        Ok(self.repo.list_buckets().await?)
    }

    /// Net balance per account listed on the customer, in listing order.
    /// Unknown customers yield an empty list.
    pub async fn account_balances(&self, username: &str) -> Result<Vec<AccountBalance>, AppError> {
        self.aggregator.aggregate(username).await
    }

    // ========================
    // Maintenance
    // ========================

    /// Write every record of a dataset. Accounts and customers are replaced by
    /// key; buckets are appended.
    pub async fn import_dataset(&self, dataset: &Dataset) -> Result<ImportSummary, AppError> {
        for account in &dataset.accounts {
            self.repo.save_account(account).await?;
        }
        for customer in &dataset.customers {
            self.repo.save_customer(customer).await?;
        }
        for bucket in &dataset.transaction_buckets {
            self.repo.save_bucket(bucket).await?;
        }

        tracing::info!(
            accounts = dataset.accounts.len(),
            customers = dataset.customers.len(),
            buckets = dataset.transaction_buckets.len(),
            "Imported dataset"
        );

        Ok(ImportSummary {
            accounts: dataset.accounts.len(),
            customers: dataset.customers.len(),
            buckets: dataset.transaction_buckets.len(),
        })
    }

    pub async fn stats(&self) -> Result<StoreStats, AppError> {
        Ok(self.repo.get_stats().await?)
    }
}
