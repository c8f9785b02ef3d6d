use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::{ImportSummary, QueryService};
use crate::domain::{Account, Customer, TransactionBucket};

/// A full set of records, as produced by [`super::Exporter::export_dataset_json`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub transaction_buckets: Vec<TransactionBucket>,
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub summary: ImportSummary,
    /// Inconsistencies found in the input. None of them block the import.
    pub warnings: Vec<ImportWarning>,
}

/// Inconsistency noticed while validating a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    /// `transaction_count` disagrees with the number of transactions
    BucketCountMismatch {
        account_id: i64,
        declared: i64,
        actual: usize,
    },
    /// A customer lists an account id with no account record
    UnknownAccount { username: String, account_id: i64 },
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportWarning::BucketCountMismatch {
                account_id,
                declared,
                actual,
            } => write!(
                f,
                "bucket for account {} declares {} transactions but holds {}",
                account_id, declared, actual
            ),
            ImportWarning::UnknownAccount {
                username,
                account_id,
            } => write!(
                f,
                "customer {} lists unknown account {}",
                username, account_id
            ),
        }
    }
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate and count without writing
    pub dry_run: bool,
}

/// Importer for loading datasets into the store
pub struct Importer<'a> {
    service: &'a QueryService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a QueryService) -> Self {
        Self { service }
    }

    /// Import a JSON dataset
    pub async fn import_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let dataset: Dataset = serde_json::from_reader(reader)
            .context("Failed to parse dataset JSON (transaction amounts must be whole numbers)")?;
        self.import_dataset(&dataset, options).await
    }

    pub async fn import_dataset(
        &self,
        dataset: &Dataset,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let warnings = validate_dataset(dataset);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let summary = if options.dry_run {
            ImportSummary {
                accounts: dataset.accounts.len(),
                customers: dataset.customers.len(),
                buckets: dataset.transaction_buckets.len(),
            }
        } else {
            self.service.import_dataset(dataset).await?
        };

        Ok(ImportResult { summary, warnings })
    }
}

/// Check a dataset for inconsistencies the store tolerates.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ImportWarning> {
    let mut warnings = Vec::new();

    for bucket in &dataset.transaction_buckets {
        if bucket.transaction_count != bucket.transactions.len() as i64 {
            warnings.push(ImportWarning::BucketCountMismatch {
                account_id: bucket.account_id,
                declared: bucket.transaction_count,
                actual: bucket.transactions.len(),
            });
        }
    }

    let known: HashSet<i64> = dataset.accounts.iter().map(|a| a.account_id).collect();
    for customer in &dataset.customers {
        for &account_id in &customer.accounts {
            if !known.contains(&account_id) {
                warnings.push(ImportWarning::UnknownAccount {
                    username: customer.username.clone(),
                    account_id,
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::domain::Transaction;

    #[test]
    fn test_validate_dataset_reports_inconsistencies() {
        let date = DateTime::from_timestamp_millis(0).unwrap();
        let mut bucket = TransactionBucket::new(1, date, date, vec![Transaction::buy(date, 3)]);
        bucket.transaction_count = 4;

        let dataset = Dataset {
            accounts: vec![Account::new(1, 10000)],
            customers: vec![Customer::new("user1").with_accounts(vec![1, 2])],
            transaction_buckets: vec![bucket],
        };

        let warnings = validate_dataset(&dataset);
        assert_eq!(
            warnings,
            vec![
                ImportWarning::BucketCountMismatch {
                    account_id: 1,
                    declared: 4,
                    actual: 1
                },
                ImportWarning::UnknownAccount {
                    username: "user1".into(),
                    account_id: 2
                },
            ]
        );
    }

    #[test]
    fn test_dataset_sections_are_optional() {
        let dataset: Dataset = serde_json::from_str(r#"{"accounts": []}"#).unwrap();
        assert!(dataset.customers.is_empty());
        assert!(validate_dataset(&dataset).is_empty());
    }
}
