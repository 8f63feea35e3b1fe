use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::model::account::AccountCategory;

pub const ACCOUNT_TYPES: [(&str, AccountCategory); 9] = [
    ("Current Assets", AccountCategory::Assets),
    ("Fixed Assets", AccountCategory::Assets),
    ("Current Liabilities", AccountCategory::Liabilities),
    ("Long-term Liabilities", AccountCategory::Liabilities),
    ("Owner's Equity", AccountCategory::Equity),
    ("Operating Revenue", AccountCategory::Revenue),
    ("Other Income", AccountCategory::Revenue),
    ("Cost of Goods Sold", AccountCategory::Expenses),
    ("Operating Expenses", AccountCategory::Expenses),
];

/// Default chart: (code, name, account type, parent code).
pub const DEFAULT_ACCOUNTS: [(&str, &str, &str, Option<&str>); 16] = [
    ("1000", "Cash and Cash Equivalents", "Current Assets", None),
    ("1010", "Cash on Hand", "Current Assets", Some("1000")),
    ("1020", "Bank Accounts", "Current Assets", Some("1000")),
    ("1100", "Accounts Receivable", "Current Assets", None),
    ("1500", "Property and Equipment", "Fixed Assets", None),
    ("2000", "Accounts Payable", "Current Liabilities", None),
    ("2100", "Salaries Payable", "Current Liabilities", None),
    ("2500", "Long-term Loans", "Long-term Liabilities", None),
    ("3000", "Owner's Capital", "Owner's Equity", None),
    ("3100", "Retained Earnings", "Owner's Equity", None),
    ("4000", "Sales Revenue", "Operating Revenue", None),
    ("4100", "Service Revenue", "Operating Revenue", None),
    ("4900", "Interest Income", "Other Income", None),
    ("5000", "Cost of Sales", "Cost of Goods Sold", None),
    ("6000", "Salaries and Wages", "Operating Expenses", None),
    ("6100", "Rent Expense", "Operating Expenses", None),
];

pub const LEAD_STAGES: [&str; 7] = [
    "New",
    "Contacted",
    "Qualified",
    "Proposal",
    "Negotiation",
    "Won",
    "Lost",
];

pub const TRAINING_TYPES: [(&str, &str); 5] = [
    ("Onboarding", "Orientation for new hires"),
    ("Compliance", "Mandatory policy and regulatory courses"),
    ("Technical", "Role-specific technical skills"),
    ("Leadership", "Management and leadership development"),
    ("Soft Skills", "Communication, teamwork and time management"),
];

pub const DEPARTMENTS: [&str; 5] = [
    "Human Resources",
    "Finance",
    "Sales",
    "Engineering",
    "Operations",
];

async fn seed_account_types(pool: &MySqlPool) -> Result<()> {
    for (name, category) in ACCOUNT_TYPES {
        sqlx::query(
            "INSERT IGNORE INTO account_types (name, category, normal_balance) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(category.as_ref())
        .bind(category.normal_balance().as_ref())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to seed account type {name}"))?;
    }
    Ok(())
}

async fn seed_chart_of_accounts(pool: &MySqlPool) -> Result<()> {
    for (code, name, type_name, parent_code) in DEFAULT_ACCOUNTS {
        let parent_id = match parent_code {
            Some(parent_code) => {
                sqlx::query_scalar::<_, u64>(
                    "SELECT id FROM chart_of_accounts WHERE account_code = ?",
                )
                .bind(parent_code)
                .fetch_optional(pool)
                .await?
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT IGNORE INTO chart_of_accounts
            (account_code, account_name, account_type_id, parent_account_id, normal_balance,
             opening_balance, current_balance, is_active)
            SELECT ?, ?, t.id, ?, t.normal_balance, 0, 0, TRUE
            FROM account_types t
            WHERE t.name = ?
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(parent_id)
        .bind(type_name)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to seed account {code}"))?;
    }
    Ok(())
}

async fn seed_lead_stages(pool: &MySqlPool) -> Result<()> {
    for (position, name) in LEAD_STAGES.iter().enumerate() {
        sqlx::query("INSERT IGNORE INTO lead_stages (name, sort_order) VALUES (?, ?)")
            .bind(*name)
            .bind(position as u32 + 1)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_training_types(pool: &MySqlPool) -> Result<()> {
    for (name, description) in TRAINING_TYPES {
        sqlx::query("INSERT IGNORE INTO training_types (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_departments(pool: &MySqlPool) -> Result<()> {
    for name in DEPARTMENTS {
        sqlx::query("INSERT IGNORE INTO departments (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn seed(pool: &MySqlPool) -> Result<()> {
    seed_account_types(pool).await?;
    seed_chart_of_accounts(pool).await?;
    seed_lead_stages(pool).await?;
    seed_training_types(pool).await?;
    seed_departments(pool).await?;
    info!("Reference data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_accounts_reference_known_types() {
        let types: HashSet<_> = ACCOUNT_TYPES.iter().map(|(name, _)| *name).collect();
        for (code, _, type_name, _) in DEFAULT_ACCOUNTS {
            assert!(types.contains(type_name), "{code} uses unknown type {type_name}");
        }
    }

    #[test]
    fn parents_are_seeded_before_children() {
        let mut seen = HashSet::new();
        for (code, _, _, parent) in DEFAULT_ACCOUNTS {
            if let Some(parent) = parent {
                assert!(seen.contains(parent), "{code} seeded before parent {parent}");
            }
            assert!(seen.insert(code), "duplicate account code {code}");
        }
    }

    #[test]
    fn reference_names_are_unique() {
        assert_eq!(LEAD_STAGES.iter().collect::<HashSet<_>>().len(), LEAD_STAGES.len());
        assert_eq!(DEPARTMENTS.iter().collect::<HashSet<_>>().len(), DEPARTMENTS.len());
    }
}
