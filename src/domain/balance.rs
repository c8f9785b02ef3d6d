use serde::{Deserialize, Serialize};

use super::{AccountId, Transaction};

/// Net balance of one account, derived on every request and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: i64,
}

impl AccountBalance {
    pub fn new(account_id: AccountId, balance: i64) -> Self {
        Self {
            account_id,
            balance,
        }
    }
}

/// Reduce transactions into a signed net balance.
///
/// A `"buy"` subtracts its amount; any other code, including a missing one,
/// adds it. A missing amount counts as zero. The sum saturates at the
/// `i64` bounds instead of overflowing.
pub fn reduce_balance<'a, I>(transactions: I) -> i64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions.into_iter().fold(0, |balance, txn| {
        let amount = txn.amount.unwrap_or(0);
        if txn.is_buy() {
            balance.saturating_sub(amount)
        } else {
            balance.saturating_add(amount)
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_empty_reduces_to_zero() {
        let none: Vec<Transaction> = Vec::new();
        assert_eq!(reduce_balance(&none), 0);
    }

    #[test]
    fn test_buy_debits_sell_credits() {
        let txns = vec![Transaction::buy(now(), 100), Transaction::sell(now(), 50)];
        assert_eq!(reduce_balance(&txns), -50);
    }

    #[test]
    fn test_unknown_code_credits() {
        let txns = vec![Transaction::new(now(), "dividend", 30)];
        assert_eq!(reduce_balance(&txns), 30);
    }

    #[test]
    fn test_missing_code_credits() {
        let txns = vec![Transaction::buy(now(), 40).without_code()];
        assert_eq!(reduce_balance(&txns), 40);
    }

    #[test]
    fn test_missing_amount_contributes_zero() {
        let txns = vec![
            Transaction::sell(now(), 0).without_amount(),
            Transaction::buy(now(), 0).without_amount(),
        ];
        assert_eq!(reduce_balance(&txns), 0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut txns = vec![
            Transaction::buy(now(), 200),
            Transaction::sell(now(), 150),
            Transaction::new(now(), "split", 5),
        ];
        let forward = reduce_balance(&txns);
        txns.reverse();
        assert_eq!(reduce_balance(&txns), forward);
        assert_eq!(forward, -45);
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        let txns = vec![Transaction::sell(now(), i64::MAX), Transaction::sell(now(), 1)];
        assert_eq!(reduce_balance(&txns), i64::MAX);

        let txns = vec![
            Transaction::buy(now(), i64::MAX),
            Transaction::buy(now(), i64::MAX),
        ];
        assert_eq!(reduce_balance(&txns), i64::MIN);
    }

    #[test]
    fn test_balance_field_names() {
        let json = serde_json::to_value(AccountBalance::new(7, -50)).unwrap();
        assert_eq!(json, serde_json::json!({"account_id": 7, "balance": -50}));
    }
}
