use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Transaction code that debits the account. Every other code credits it.
pub const BUY_CODE: &str = "buy";

/// Transaction code that credits the account.
pub const SELL_CODE: &str = "sell";

/// A single trade inside a bucket.
///
/// `amount` and `transaction_code` can be missing in stored data. Such records
/// still take part in balance computation (see [`super::reduce_balance`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Quantity traded (non-negative)
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub total: f64,
}

/// Something missing from a stored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionIssue {
    MissingAmount,
    MissingCode,
}

impl Transaction {
    pub fn new(date: DateTime<Utc>, code: impl Into<String>, amount: i64) -> Self {
        Self {
            date,
            amount: Some(amount),
            transaction_code: Some(code.into()),
            symbol: String::new(),
            price: 0.0,
            total: 0.0,
        }
    }

    pub fn buy(date: DateTime<Utc>, amount: i64) -> Self {
        Self::new(date, BUY_CODE, amount)
    }

    pub fn sell(date: DateTime<Utc>, amount: i64) -> Self {
        Self::new(date, SELL_CODE, amount)
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set the unit price and derive `total` from it.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self.total = price * self.amount.unwrap_or(0) as f64;
        self
    }

    pub fn without_amount(mut self) -> Self {
        self.amount = None;
        self
    }

    pub fn without_code(mut self) -> Self {
        self.transaction_code = None;
        self
    }

    pub fn is_buy(&self) -> bool {
        self.transaction_code.as_deref() == Some(BUY_CODE)
    }

    /// Missing fields that degrade this transaction's contribution.
    pub fn issues(&self) -> Vec<TransactionIssue> {
        let mut issues = Vec::new();
        if self.amount.is_none() {
            issues.push(TransactionIssue::MissingAmount);
        }
        if self.transaction_code.is_none() {
            issues.push(TransactionIssue::MissingCode);
        }
        issues
    }
}

/// A time window of transactions for one account. An account can have many
/// buckets; together they form the account's full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBucket {
    pub account_id: AccountId,
    #[serde(default)]
    pub transaction_count: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub bucket_start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub bucket_end_date: DateTime<Utc>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl TransactionBucket {
    /// Create a bucket; `transaction_count` follows the given transactions.
    pub fn new(
        account_id: AccountId,
        bucket_start_date: DateTime<Utc>,
        bucket_end_date: DateTime<Utc>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            account_id,
            transaction_count: transactions.len() as i64,
            bucket_start_date,
            bucket_end_date,
            transactions,
        }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.bucket_start_date && date <= self.bucket_end_date
    }
}
