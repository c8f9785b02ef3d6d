use std::time::Duration;

use thiserror::Error;

use crate::domain::AccountId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Timed out after {timeout:?} fetching transaction buckets for account {account_id}")]
    FetchTimeout {
        account_id: AccountId,
        timeout: Duration,
    },

    #[error("Data source error: {0:#}")]
    DataSource(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures of the underlying data access, as opposed to lookups
    /// that found nothing.
    pub fn is_data_source(&self) -> bool {
        matches!(self, AppError::DataSource(_) | AppError::FetchTimeout { .. })
    }
}
