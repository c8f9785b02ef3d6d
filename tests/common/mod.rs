// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bucketbook::application::QueryService;
use bucketbook::config::AggregationConfig;
use bucketbook::domain::{
    Account, Customer, TierDetails, Transaction, TransactionBucket,
};
use bucketbook::io::Dataset;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(QueryService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service =
        QueryService::init(db_path.to_str().unwrap(), &AggregationConfig::default()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Bucket covering January 2023
pub fn january_bucket(account_id: i64, transactions: Vec<Transaction>) -> TransactionBucket {
    TransactionBucket::new(
        account_id,
        parse_date("2023-01-01"),
        parse_date("2023-01-31"),
        transactions,
    )
}

/// Test fixture: two accounts and one customer holding both
pub struct SampleData;

impl SampleData {
    pub fn dataset() -> Dataset {
        let customer = Customer::new("testUser")
            .with_name("Test User")
            .with_email("test@example.com")
            .with_accounts(vec![1, 2])
            .with_tier(
                "tier1",
                TierDetails {
                    id: "1".into(),
                    tier: "Gold".into(),
                    benefits: vec!["benefit1".into()],
                    active: true,
                },
            )
            .with_tier(
                "tier2",
                TierDetails {
                    id: "2".into(),
                    tier: "Silver".into(),
                    benefits: vec!["benefit2".into()],
                    active: false,
                },
            );

        Dataset {
            accounts: vec![
                Account::new(1, 1000).with_products(["savings", "checking"]),
                Account::new(2, 10000).with_products(["InvestmentStock"]),
            ],
            customers: vec![customer],
            transaction_buckets: vec![
                january_bucket(
                    1,
                    vec![
                        Transaction::buy(parse_date("2023-01-15"), 100)
                            .with_symbol("AAPL")
                            .with_price(150.0),
                        Transaction::sell(parse_date("2023-01-20"), 50)
                            .with_symbol("AAPL")
                            .with_price(160.0),
                    ],
                ),
                january_bucket(
                    2,
                    vec![
                        Transaction::buy(parse_date("2023-01-10"), 200).with_symbol("MSFT"),
                        Transaction::sell(parse_date("2023-01-25"), 150).with_symbol("MSFT"),
                    ],
                ),
            ],
        }
    }

    /// Import the sample dataset into the service
    pub async fn load(service: &QueryService) -> Result<()> {
        service.import_dataset(&Self::dataset()).await?;
        Ok(())
    }
}
