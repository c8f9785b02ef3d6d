use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Membership tier attached to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDetails {
    pub id: String,
    pub tier: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

/// A customer, keyed by username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Serialized as epoch milliseconds
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub birthdate: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email: String,
    /// Account ids in the order the customer lists them. May contain
    /// duplicates and ids of accounts that no longer exist.
    #[serde(default)]
    pub accounts: Vec<AccountId>,
    /// Tiers keyed by an opaque tier key
    #[serde(default)]
    pub tier_and_details: BTreeMap<String, TierDetails>,
}

impl Customer {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: String::new(),
            address: String::new(),
            birthdate: None,
            email: String::new(),
            accounts: Vec::new(),
            tier_and_details: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<AccountId>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_tier(mut self, key: impl Into<String>, details: TierDetails) -> Self {
        self.tier_and_details.insert(key.into(), details);
        self
    }

    /// Tier details as a flat list, ordered by tier key.
    pub fn tiers(&self) -> Vec<&TierDetails> {
        self.tier_and_details.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(id: &str, tier: &str, active: bool) -> TierDetails {
        TierDetails {
            id: id.into(),
            tier: tier.into(),
            benefits: vec![format!("{} benefit", tier)],
            active,
        }
    }

    #[test]
    fn test_tiers_flatten_map_values() {
        let customer = Customer::new("user1")
            .with_tier("tier2", tier("2", "Silver", false))
            .with_tier("tier1", tier("1", "Gold", true));

        let tiers = customer.tiers();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].tier, "Gold");
        assert_eq!(tiers[1].tier, "Silver");
    }

    #[test]
    fn test_birthdate_serializes_as_millis() {
        let mut customer = Customer::new("user1");
        customer.birthdate = DateTime::from_timestamp_millis(1672531200000);

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["birthdate"], 1672531200000i64);
    }

    #[test]
    fn test_accounts_keep_duplicates_and_order() {
        let customer: Customer =
            serde_json::from_str(r#"{"username": "u", "accounts": [3, 1, 3]}"#).unwrap();
        assert_eq!(customer.accounts, vec![3, 1, 3]);
        assert!(customer.tier_and_details.is_empty());
    }
}
