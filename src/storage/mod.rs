mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;

use crate::domain::{AccountId, Customer, TransactionBucket};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Resolves customers by username.
#[async_trait::async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn lookup(&self, username: &str) -> Result<Option<Customer>>;
}

/// Supplies every transaction bucket recorded for an account.
///
/// An account without buckets yields an empty list, not an error.
#[async_trait::async_trait]
pub trait TransactionBucketSource: Send + Sync {
    async fn fetch(&self, account_id: AccountId) -> Result<Vec<TransactionBucket>>;
}
