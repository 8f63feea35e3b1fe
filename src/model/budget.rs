use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::{Workflow, round_money};
use crate::error::ApiError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BudgetStatus {
    Draft,
    Approved,
    Active,
    Closed,
}

impl Workflow for BudgetStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            BudgetStatus::Draft => &[BudgetStatus::Approved],
            BudgetStatus::Approved => &[BudgetStatus::Active],
            BudgetStatus::Active => &[BudgetStatus::Closed],
            BudgetStatus::Closed => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Budget {
    pub id: u64,
    #[schema(example = "FY2026 Operations")]
    pub budget_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[schema(example = 250000.0)]
    pub total_budget: f64,
    #[schema(example = "draft")]
    pub status: String,
    pub approved_by: Option<u64>,
    pub created_by: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BudgetAllocation {
    pub id: u64,
    pub budget_id: u64,
    pub account_id: u64,
    pub account_code: Option<String>,
    pub account_name: Option<String>,
    pub allocated_amount: f64,
    pub spent_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub allocated: f64,
    pub spent: f64,
    pub unallocated: f64,
    pub remaining: f64,
}

impl BudgetSummary {
    pub fn new(total_budget: f64, allocated: f64, spent: f64) -> Self {
        Self {
            total_budget: round_money(total_budget),
            allocated: round_money(allocated),
            spent: round_money(spent),
            unallocated: round_money(total_budget - allocated),
            remaining: round_money(allocated - spent),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetDetail {
    #[serde(flatten)]
    pub budget: Budget,
    pub summary: BudgetSummary,
    pub allocations: Vec<BudgetAllocation>,
}

/// Checks that adding `additional` keeps allocations within the budget.
pub fn check_allocation_fits(
    total_budget: f64,
    already_allocated: f64,
    additional: f64,
) -> Result<(), ApiError> {
    if !additional.is_finite() || additional <= 0.0 {
        return Err(ApiError::validation("Allocated amount must be positive"));
    }
    let available = round_money(total_budget - already_allocated);
    if round_money(additional) > available {
        return Err(ApiError::validation(format!(
            "Allocation exceeds the remaining budget of {available:.2}"
        )));
    }
    Ok(())
}

pub fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::validation("period_end cannot be before period_start"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_lifecycle_is_linear() {
        assert!(BudgetStatus::Draft.can_transition_to(BudgetStatus::Approved));
        assert!(!BudgetStatus::Draft.can_transition_to(BudgetStatus::Active));
        assert!(BudgetStatus::Approved.can_transition_to(BudgetStatus::Active));
        assert!(BudgetStatus::Active.can_transition_to(BudgetStatus::Closed));
        assert!(BudgetStatus::Closed.allowed_next().is_empty());
    }

    #[test]
    fn allocation_must_fit_remaining_budget() {
        assert!(check_allocation_fits(1000.0, 600.0, 400.0).is_ok());
        assert!(check_allocation_fits(1000.0, 600.0, 400.01).is_err());
        assert!(check_allocation_fits(1000.0, 0.0, 0.0).is_err());
        assert!(check_allocation_fits(1000.0, 0.0, -5.0).is_err());
    }

    #[test]
    fn summary_derives_remaining_amounts() {
        let summary = BudgetSummary::new(1000.0, 750.5, 120.25);
        assert_eq!(summary.unallocated, 249.5);
        assert_eq!(summary.remaining, 630.25);
    }

    #[test]
    fn period_end_must_not_precede_start() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert!(validate_period(start, end).is_err());
        assert!(validate_period(start, start).is_ok());
    }
}
