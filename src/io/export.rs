use anyhow::Result;
use std::io::Write;

use crate::application::QueryService;
use crate::domain::AccountBalance;

use super::Dataset;

/// Exporter for converting stored data and balances to CSV or JSON
pub struct Exporter<'a> {
    service: &'a QueryService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a QueryService) -> Self {
        Self { service }
    }

    /// Export a customer's balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, username: &str, writer: W) -> Result<usize> {
        let balances = self.service.account_balances(username).await?;
        write_balances_csv(&balances, writer)?;
        Ok(balances.len())
    }

    /// Export a customer's balances as a JSON array of `{account_id, balance}`
    pub async fn export_balances_json<W: Write>(
        &self,
        username: &str,
        writer: W,
    ) -> Result<usize> {
        let balances = self.service.account_balances(username).await?;
        write_balances_json(&balances, writer)?;
        Ok(balances.len())
    }

    /// Export every stored record as a dataset that [`super::Importer`] accepts
    pub async fn export_dataset_json<W: Write>(&self, mut writer: W) -> Result<Dataset> {
        let dataset = Dataset {
            accounts: self.service.list_accounts().await?,
            customers: self.service.list_customers().await?,
            transaction_buckets: self.service.list_all_buckets().await?,
        };

        let json = serde_json::to_string_pretty(&dataset)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(dataset)
    }
}

pub fn write_balances_csv<W: Write>(balances: &[AccountBalance], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    // Write header
    csv_writer.write_record(["account_id", "balance"])?;

    for balance in balances {
        csv_writer.write_record(&[balance.account_id.to_string(), balance.balance.to_string()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_balances_json<W: Write>(balances: &[AccountBalance], mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(balances)?;
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_balances_csv() {
        let mut out = Vec::new();
        write_balances_csv(
            &[AccountBalance::new(1, -50), AccountBalance::new(2, 75)],
            &mut out,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "account_id,balance\n1,-50\n2,75\n"
        );
    }

    #[test]
    fn test_write_balances_json() {
        let mut out = Vec::new();
        write_balances_json(&[AccountBalance::new(1, -50)], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"account_id": 1, "balance": -50}]));
    }
}
