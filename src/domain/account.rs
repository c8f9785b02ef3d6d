use serde::{Deserialize, Serialize};

pub type AccountId = i64;

/// A brokerage account as stored by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    /// Credit limit
    #[serde(default)]
    pub limit: i64,
    /// Product tags (e.g. "InvestmentStock", "Derivatives")
    #[serde(default)]
    pub products: Vec<String>,
}

impl Account {
    pub fn new(account_id: AccountId, limit: i64) -> Self {
        Self {
            account_id,
            limit,
            products: Vec::new(),
        }
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_product(&self, product: &str) -> bool {
        self.products.iter().any(|p| p == product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_products() {
        let account = Account::new(371138, 9000).with_products(["Derivatives", "InvestmentStock"]);
        assert!(account.has_product("Derivatives"));
        assert!(!account.has_product("Commodity"));
    }

    #[test]
    fn test_account_missing_fields_default() {
        let account: Account = serde_json::from_str(r#"{"account_id": 5}"#).unwrap();
        assert_eq!(account, Account::new(5, 0));
    }
}
