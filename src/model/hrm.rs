use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::{Workflow, round_money};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Finance")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Terminated,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department_id": 2,
        "designation": "Accountant",
        "hire_date": "2024-01-01",
        "basic_salary": 45000.0,
        "status": "active"
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: Option<u64>,
    pub designation: Option<String>,
    pub hire_date: NaiveDate,
    pub basic_salary: f64,
    pub status: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl Workflow for LeaveStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            LeaveStatus::Pending => &[LeaveStatus::Approved, LeaveStatus::Rejected],
            LeaveStatus::Approved | LeaveStatus::Rejected => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub approved_by: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResignationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl Workflow for ResignationStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            ResignationStatus::Pending => &[ResignationStatus::Accepted, ResignationStatus::Rejected],
            ResignationStatus::Accepted | ResignationStatus::Rejected => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Resignation {
    pub id: u64,
    pub employee_id: u64,
    pub resignation_date: NaiveDate,
    pub last_working_date: NaiveDate,
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub approved_by: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayrollStatus {
    Draft,
    Paid,
}

impl Workflow for PayrollStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            PayrollStatus::Draft => &[PayrollStatus::Paid],
            PayrollStatus::Paid => &[],
        }
    }
}

/// A named amount inside an allowance, deduction or loan breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[schema(example = "House rent")]
    pub title: String,
    #[schema(example = 1500.0)]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OvertimeItem {
    #[schema(example = "Month-end close")]
    pub title: String,
    #[schema(example = 6.5)]
    pub hours: f64,
    #[schema(example = 25.0)]
    pub rate: f64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollEntry {
    pub id: u64,
    pub employee_id: u64,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub basic_salary: f64,
    #[schema(value_type = Vec<LineItem>)]
    pub allowances: Json<Vec<LineItem>>,
    #[schema(value_type = Vec<LineItem>)]
    pub deductions: Json<Vec<LineItem>>,
    #[schema(value_type = Vec<OvertimeItem>)]
    pub overtimes: Json<Vec<OvertimeItem>>,
    #[schema(value_type = Vec<LineItem>)]
    pub loans: Json<Vec<LineItem>>,
    pub total_allowances: f64,
    pub total_deductions: f64,
    pub total_overtime: f64,
    pub total_loans: f64,
    pub gross_pay: f64,
    pub net_pay: f64,
    #[schema(example = "draft")]
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Inputs of one payroll entry, before totals are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayrollBreakdown {
    pub basic_salary: f64,
    pub allowances: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
    pub overtimes: Vec<OvertimeItem>,
    pub loans: Vec<LineItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PayrollTotals {
    pub total_allowances: f64,
    pub total_deductions: f64,
    pub total_overtime: f64,
    pub total_loans: f64,
    pub gross_pay: f64,
    pub net_pay: f64,
}

fn non_negative(label: &str, title: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!(
            "{label} '{title}' must be a non-negative number"
        )));
    }
    Ok(value)
}

fn sum_items(label: &str, items: &[LineItem]) -> Result<f64, ApiError> {
    items.iter().try_fold(0.0, |acc, item| {
        Ok(acc + non_negative(label, &item.title, item.amount)?)
    })
}

impl PayrollBreakdown {
    /// gross = basic + allowances + overtime; net = gross - deductions - loans.
    pub fn totals(&self) -> Result<PayrollTotals, ApiError> {
        let basic = non_negative("Basic salary", "basic_salary", self.basic_salary)?;
        let total_allowances = sum_items("Allowance", &self.allowances)?;
        let total_deductions = sum_items("Deduction", &self.deductions)?;
        let total_loans = sum_items("Loan", &self.loans)?;
        let total_overtime = self.overtimes.iter().try_fold(0.0, |acc, item| {
            let hours = non_negative("Overtime hours", &item.title, item.hours)?;
            let rate = non_negative("Overtime rate", &item.title, item.rate)?;
            Ok::<f64, ApiError>(acc + hours * rate)
        })?;

        let gross_pay = basic + total_allowances + total_overtime;
        let net_pay = gross_pay - total_deductions - total_loans;

        Ok(PayrollTotals {
            total_allowances: round_money(total_allowances),
            total_deductions: round_money(total_deductions),
            total_overtime: round_money(total_overtime),
            total_loans: round_money(total_loans),
            gross_pay: round_money(gross_pay),
            net_pay: round_money(net_pay),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, amount: f64) -> LineItem {
        LineItem {
            title: title.into(),
            amount,
        }
    }

    #[test]
    fn totals_combine_every_breakdown() {
        let breakdown = PayrollBreakdown {
            basic_salary: 3000.0,
            allowances: vec![item("Housing", 500.0), item("Transport", 120.25)],
            deductions: vec![item("Tax", 410.1)],
            overtimes: vec![OvertimeItem {
                title: "Weekend".into(),
                hours: 4.5,
                rate: 20.0,
            }],
            loans: vec![item("Car loan", 250.0)],
        };

        let totals = breakdown.totals().unwrap();
        assert_eq!(totals.total_allowances, 620.25);
        assert_eq!(totals.total_overtime, 90.0);
        assert_eq!(totals.total_deductions, 410.1);
        assert_eq!(totals.total_loans, 250.0);
        assert_eq!(totals.gross_pay, 3710.25);
        assert_eq!(totals.net_pay, 3050.15);
    }

    #[test]
    fn empty_breakdown_pays_basic_salary() {
        let breakdown = PayrollBreakdown {
            basic_salary: 1234.5,
            ..Default::default()
        };
        let totals = breakdown.totals().unwrap();
        assert_eq!(totals.gross_pay, 1234.5);
        assert_eq!(totals.net_pay, 1234.5);
    }

    #[test]
    fn net_pay_may_go_negative_when_deductions_dominate() {
        let breakdown = PayrollBreakdown {
            basic_salary: 100.0,
            deductions: vec![item("Advance", 150.0)],
            ..Default::default()
        };
        assert_eq!(breakdown.totals().unwrap().net_pay, -50.0);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let breakdown = PayrollBreakdown {
            basic_salary: 100.0,
            allowances: vec![item("Bonus", -1.0)],
            ..Default::default()
        };
        assert!(matches!(breakdown.totals(), Err(ApiError::Validation(_))));

        let breakdown = PayrollBreakdown {
            basic_salary: 100.0,
            overtimes: vec![OvertimeItem {
                title: "Night".into(),
                hours: 2.0,
                rate: -3.0,
            }],
            ..Default::default()
        };
        assert!(breakdown.totals().is_err());
    }

    #[test]
    fn workflow_edges() {
        assert!(LeaveStatus::Pending.can_transition_to(LeaveStatus::Approved));
        assert!(!LeaveStatus::Rejected.can_transition_to(LeaveStatus::Approved));
        assert!(!PayrollStatus::Paid.can_transition_to(PayrollStatus::Draft));
        assert_eq!(
            ResignationStatus::predecessors(ResignationStatus::Accepted),
            vec![ResignationStatus::Pending]
        );
    }

    #[test]
    fn statuses_parse_from_snake_case() {
        assert_eq!("terminated".parse::<EmployeeStatus>(), Ok(EmployeeStatus::Terminated));
        assert_eq!(LeaveType::Annual.as_ref(), "annual");
        assert!("archived".parse::<ResignationStatus>().is_err());
    }
}
