use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Account, AccountId, Customer, TransactionBucket};

use super::{CustomerDirectory, MIGRATION_001_INITIAL, TransactionBucketSource};

/// Record counts, used by `init` output and import checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub account_count: i64,
    pub customer_count: i64,
    pub bucket_count: i64,
}

/// Repository for persisting and querying accounts, customers and buckets.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close every pooled connection. Further queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Account operations
    // ========================

    /// Insert or replace an account.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        let products_json = serde_json::to_string(&account.products)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO accounts (account_id, credit_limit, products)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(account.account_id)
        .bind(account.limit)
        .bind(&products_json)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save account {}", account.account_id))?;
        Ok(())
    }

    /// Get an account by its account id.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, credit_limit, products
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts ordered by account id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT account_id, credit_limit, products FROM accounts ORDER BY account_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let products_json: String = row.get("products");

        Ok(Account {
            account_id: row.get("account_id"),
            limit: row.get("credit_limit"),
            products: serde_json::from_str(&products_json).context("Invalid products")?,
        })
    }

    // ========================
    // Customer operations
    // ========================

    /// Insert or replace a customer.
    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        let accounts_json = serde_json::to_string(&customer.accounts)?;
        let tiers_json = serde_json::to_string(&customer.tier_and_details)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO customers (username, name, address, birthdate, email, accounts, tier_and_details)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.username)
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(customer.birthdate.map(|dt| dt.timestamp_millis()))
        .bind(&customer.email)
        .bind(&accounts_json)
        .bind(&tiers_json)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save customer {}", customer.username))?;
        Ok(())
    }

    /// Get a customer by username.
    pub async fn get_customer(&self, username: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT username, name, address, birthdate, email, accounts, tier_and_details
            FROM customers
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// List all customers ordered by username.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            r#"
            SELECT username, name, address, birthdate, email, accounts, tier_and_details
            FROM customers
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer> {
        let birthdate_ms: Option<i64> = row.get("birthdate");
        let accounts_json: String = row.get("accounts");
        let tiers_json: String = row.get("tier_and_details");

        Ok(Customer {
            username: row.get("username"),
            name: row.get("name"),
            address: row.get("address"),
            birthdate: birthdate_ms.map(millis_to_datetime).transpose()?,
            email: row.get("email"),
            accounts: serde_json::from_str(&accounts_json).context("Invalid account list")?,
            tier_and_details: serde_json::from_str(&tiers_json)
                .context("Invalid tier details")?,
        })
    }

    // ========================
    // Transaction bucket operations
    // ========================

    /// Append a bucket. Buckets are never merged or replaced.
    pub async fn save_bucket(&self, bucket: &TransactionBucket) -> Result<()> {
        let transactions_json = serde_json::to_string(&bucket.transactions)?;

        sqlx::query(
            r#"
            INSERT INTO transaction_buckets (account_id, transaction_count, bucket_start_date, bucket_end_date, transactions)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(bucket.account_id)
        .bind(bucket.transaction_count)
        .bind(bucket.bucket_start_date.timestamp_millis())
        .bind(bucket.bucket_end_date.timestamp_millis())
        .bind(&transactions_json)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save bucket for account {}", bucket.account_id))?;
        Ok(())
    }

    /// List every bucket of an account, oldest window first.
    pub async fn list_buckets_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionBucket>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, transaction_count, bucket_start_date, bucket_end_date, transactions
            FROM transaction_buckets
            WHERE account_id = ?
            ORDER BY bucket_start_date, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list buckets for account {}", account_id))?;

        rows.iter().map(Self::row_to_bucket).collect()
    }

    /// List every stored bucket, grouped by account.
    pub async fn list_buckets(&self) -> Result<Vec<TransactionBucket>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, transaction_count, bucket_start_date, bucket_end_date, transactions
            FROM transaction_buckets
            ORDER BY account_id, bucket_start_date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list buckets")?;

        rows.iter().map(Self::row_to_bucket).collect()
    }

    fn row_to_bucket(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionBucket> {
        let transactions_json: String = row.get("transactions");

        Ok(TransactionBucket {
            account_id: row.get("account_id"),
            transaction_count: row.get("transaction_count"),
            bucket_start_date: millis_to_datetime(row.get("bucket_start_date"))?,
            bucket_end_date: millis_to_datetime(row.get("bucket_end_date"))?,
            transactions: serde_json::from_str(&transactions_json)
                .context("Invalid transactions")?,
        })
    }

    /// Count stored records of each type.
    pub async fn get_stats(&self) -> Result<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM accounts) as account_count,
                (SELECT COUNT(*) FROM customers) as customer_count,
                (SELECT COUNT(*) FROM transaction_buckets) as bucket_count
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count records")?;

        Ok(StoreStats {
            account_count: row.get("account_count"),
            customer_count: row.get("customer_count"),
            bucket_count: row.get("bucket_count"),
        })
    }
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {}", ms))
}

#[async_trait::async_trait]
impl CustomerDirectory for Repository {
    async fn lookup(&self, username: &str) -> Result<Option<Customer>> {
        self.get_customer(username).await
    }
}

#[async_trait::async_trait]
impl TransactionBucketSource for Repository {
    async fn fetch(&self, account_id: AccountId) -> Result<Vec<TransactionBucket>> {
        self.list_buckets_for_account(account_id).await
    }
}
