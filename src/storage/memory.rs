//! In-memory collaborator, mostly for tests.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::domain::{AccountId, Customer, TransactionBucket};

use super::{CustomerDirectory, TransactionBucketSource};

/// Customers and buckets held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<String, Customer>>,
    buckets: RwLock<HashMap<AccountId, Vec<TransactionBucket>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_customer(&self, customer: Customer) {
        let mut customers = self.customers.write().await;
        customers.insert(customer.username.clone(), customer);
    }

    pub async fn insert_bucket(&self, bucket: TransactionBucket) {
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.account_id).or_default().push(bucket);
    }
}

#[async_trait::async_trait]
impl CustomerDirectory for MemoryStore {
    async fn lookup(&self, username: &str) -> Result<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.get(username).cloned())
    }
}

#[async_trait::async_trait]
impl TransactionBucketSource for MemoryStore {
    async fn fetch(&self, account_id: AccountId) -> Result<Vec<TransactionBucket>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(&account_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::Transaction;

    #[tokio::test]
    async fn test_lookup_and_fetch() -> Result<()> {
        let store = MemoryStore::new();
        store
            .insert_customer(Customer::new("user1").with_accounts(vec![1]))
            .await;
        let now = Utc::now();
        store
            .insert_bucket(TransactionBucket::new(1, now, now, vec![Transaction::buy(now, 5)]))
            .await;
        store
            .insert_bucket(TransactionBucket::new(1, now, now, vec![]))
            .await;

        let customer = store.lookup("user1").await?;
        assert_eq!(customer.map(|c| c.accounts), Some(vec![1]));
        assert!(store.lookup("nobody").await?.is_none());

        assert_eq!(store.fetch(1).await?.len(), 2);
        assert!(store.fetch(2).await?.is_empty());
        Ok(())
    }
}
