use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use tracing::warn;

use crate::error::ApiError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountCategory {
    Assets,
    Liabilities,
    Equity,
    Revenue,
    Expenses,
}

impl AccountCategory {
    /// Debit-normal for assets and expenses, credit-normal otherwise.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountCategory::Assets | AccountCategory::Expenses => NormalBalance::Debit,
            AccountCategory::Liabilities | AccountCategory::Equity | AccountCategory::Revenue => {
                NormalBalance::Credit
            }
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NormalBalance {
    Debit,
    Credit,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AccountType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Current Assets")]
    pub name: String,
    #[schema(example = "assets")]
    pub category: String,
    #[schema(example = "debit")]
    pub normal_balance: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 4,
    "account_code": "1010",
    "account_name": "Cash on Hand",
    "account_type_id": 1,
    "parent_account_id": 2,
    "normal_balance": "debit",
    "opening_balance": 500.0,
    "current_balance": 500.0,
    "is_active": true,
    "description": null
}))]
pub struct ChartOfAccount {
    pub id: u64,
    pub account_code: String,
    pub account_name: String,
    pub account_type_id: u64,
    pub parent_account_id: Option<u64>,
    pub normal_balance: String,
    pub opening_balance: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub description: Option<String>,
}

/// Ancestor walks stop here even if the data is corrupt.
pub const MAX_DEPTH: usize = 64;

/// `parent_id` followed by its ancestors, nearest first.
///
/// `parent_of(id)` yields `None` for an unknown account and `Some(None)`
/// for a root. A loop in stored data ends the walk instead of spinning.
pub fn ancestor_chain<F>(parent_id: u64, mut parent_of: F) -> Result<Vec<u64>, ApiError>
where
    F: FnMut(u64) -> Option<Option<u64>>,
{
    let mut chain = Vec::new();
    let mut next = Some(parent_id);

    while let Some(id) = next {
        if chain.contains(&id) || chain.len() >= MAX_DEPTH {
            warn!(account_id = id, "Chart of accounts hierarchy loop or depth limit hit");
            break;
        }
        match parent_of(id) {
            Some(parent) => {
                chain.push(id);
                next = parent;
            }
            None if chain.is_empty() => {
                return Err(ApiError::validation("Parent account does not exist"));
            }
            None => break,
        }
    }

    Ok(chain)
}

/// Rejects a parent that is the account itself or one of its descendants.
///
/// `parent_chain` is the parent followed by its ancestors, nearest first.
pub fn validate_parent(account_id: Option<u64>, parent_chain: &[u64]) -> Result<(), ApiError> {
    let Some(account_id) = account_id else {
        return Ok(());
    };
    match parent_chain.iter().position(|id| *id == account_id) {
        Some(0) => Err(ApiError::validation("An account cannot be its own parent")),
        Some(_) => Err(ApiError::validation(
            "Parent account cannot be a descendant of this account",
        )),
        None => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Vendor {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "VEN-0003")]
    pub vendor_code: String,
    #[schema(example = "Northwind Supplies")]
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_number: Option<String>,
    #[schema(example = 30)]
    pub payment_terms: Option<u32>,
    pub credit_limit: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn normal_balance_follows_category() {
        assert_eq!(AccountCategory::Assets.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountCategory::Expenses.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountCategory::Revenue.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountCategory::Equity.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn parent_validation() {
        assert!(validate_parent(None, &[1, 2]).is_ok());
        assert!(validate_parent(Some(5), &[1, 2]).is_ok());
        assert!(validate_parent(Some(5), &[]).is_ok());
        assert!(matches!(
            validate_parent(Some(5), &[5]),
            Err(ApiError::Validation(m)) if m.contains("own parent")
        ));
        assert!(matches!(
            validate_parent(Some(5), &[9, 7, 5]),
            Err(ApiError::Validation(m)) if m.contains("descendant")
        ));
    }

    // 1 -> 2 -> 3 -> 4, plus a separate root 10
    fn tree() -> HashMap<u64, Option<u64>> {
        HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (10, None)])
    }

    #[test]
    fn chain_lists_parent_then_ancestors() {
        let map = tree();
        let chain = ancestor_chain(4, |id| map.get(&id).copied()).unwrap();
        assert_eq!(chain, vec![4, 3, 2, 1]);
    }

    #[test]
    fn reparenting_under_a_descendant_is_rejected() {
        let map = tree();
        // moving account 2 under its grandchild 4
        let chain = ancestor_chain(4, |id| map.get(&id).copied()).unwrap();
        assert!(matches!(
            validate_parent(Some(2), &chain),
            Err(ApiError::Validation(m)) if m.contains("descendant")
        ));

        // moving it under an unrelated root is fine
        let chain = ancestor_chain(10, |id| map.get(&id).copied()).unwrap();
        assert!(validate_parent(Some(2), &chain).is_ok());
    }

    #[test]
    fn unknown_parent_is_a_validation_error() {
        let map = tree();
        assert!(matches!(
            ancestor_chain(99, |id| map.get(&id).copied()),
            Err(ApiError::Validation(m)) if m.contains("does not exist")
        ));
    }

    #[test]
    fn corrupt_loop_terminates() {
        let looped = HashMap::from([(1, Some(2)), (2, Some(1))]);
        let chain = ancestor_chain(1, |id| looped.get(&id).copied()).unwrap();
        assert_eq!(chain, vec![1, 2]);
    }
}
