use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool, types::Json};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::leave_request::visible_employee;
use crate::{
    api::message,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::hrm::{
        LineItem, OvertimeItem, PayrollBreakdown, PayrollEntry, PayrollStatus, PayrollTotals,
    },
    utils::{
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const PAYROLL_COLUMNS: &str = "id, employee_id, pay_period_start, pay_period_end, basic_salary, \
     allowances, deductions, overtimes, loans, total_allowances, total_deductions, total_overtime, \
     total_loans, gross_pay, net_pay, status, paid_at";

const SORTABLE: [(&str, &str); 4] = [
    ("pay_period_start", "pay_period_start"),
    ("id", "id"),
    ("net_pay", "net_pay"),
    ("gross_pay", "gross_pay"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreatePayrollEntry {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub pay_period_start: NaiveDate,
    #[schema(example = "2026-01-31")]
    pub pay_period_end: NaiveDate,
    /// Defaults to the employee's basic salary
    #[schema(example = 50000.0)]
    pub basic_salary: Option<f64>,
    #[serde(default)]
    pub allowances: Vec<LineItem>,
    #[serde(default)]
    pub deductions: Vec<LineItem>,
    #[serde(default)]
    pub overtimes: Vec<OvertimeItem>,
    #[serde(default)]
    pub loans: Vec<LineItem>,
}

/// Omitted fields keep their stored value; lists replace wholesale.
#[derive(Deserialize, ToSchema)]
pub struct UpdatePayrollEntry {
    pub pay_period_start: Option<NaiveDate>,
    pub pay_period_end: Option<NaiveDate>,
    #[schema(example = 52000.0)]
    pub basic_salary: Option<f64>,
    pub allowances: Option<Vec<LineItem>>,
    pub deductions: Option<Vec<LineItem>>,
    pub overtimes: Option<Vec<OvertimeItem>>,
    pub loans: Option<Vec<LineItem>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PayrollQuery {
    #[param(example = 1)]
    pub page: Option<u32>,
    #[param(example = 10)]
    pub per_page: Option<u32>,
    #[param(example = 1001)]
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    /// Entries whose period starts on or after this date
    pub period_from: Option<NaiveDate>,
    /// Entries whose period ends on or before this date
    pub period_to: Option<NaiveDate>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::validation(
            "pay_period_end cannot be before pay_period_start",
        ));
    }
    Ok(())
}

fn ensure_draft(status: &str, action: &str) -> Result<(), ApiError> {
    if status != PayrollStatus::Draft.as_ref() {
        return Err(ApiError::conflict(format!(
            "Paid payroll entries cannot be {action}"
        )));
    }
    Ok(())
}

async fn fetch_for_update(conn: &mut MySqlConnection, id: u64) -> ApiResult<PayrollEntry> {
    sqlx::query_as::<_, PayrollEntry>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payroll_entries WHERE id = ? FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ApiError::NotFound("Payroll entry"))
}

#[utoipa::path(
    post,
    path = "/api/hrm/payroll-entries",
    request_body = CreatePayrollEntry,
    responses(
        (status = 201, description = "Payroll entry created with computed totals", body = PayrollTotals),
        (status = 400, description = "Negative amount or invalid period"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Entry already exists for this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn create_payroll_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePayrollEntry>,
) -> ApiResult<HttpResponse> {
    auth.require("create-payroll-entries")?;
    let payload = payload.into_inner();
    validate_period(payload.pay_period_start, payload.pay_period_end)?;

    let basic_salary = match payload.basic_salary {
        Some(amount) => amount,
        None => sqlx::query_scalar::<_, f64>("SELECT basic_salary FROM employees WHERE id = ?")
            .bind(payload.employee_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or(ApiError::NotFound("Employee"))?,
    };

    let breakdown = PayrollBreakdown {
        basic_salary,
        allowances: payload.allowances,
        deductions: payload.deductions,
        overtimes: payload.overtimes,
        loans: payload.loans,
    };
    let totals = breakdown.totals()?;

    let result = sqlx::query(
        r#"
        INSERT INTO payroll_entries
        (employee_id, pay_period_start, pay_period_end, basic_salary,
         allowances, deductions, overtimes, loans,
         total_allowances, total_deductions, total_overtime, total_loans,
         gross_pay, net_pay, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.pay_period_start)
    .bind(payload.pay_period_end)
    .bind(breakdown.basic_salary)
    .bind(Json(&breakdown.allowances))
    .bind(Json(&breakdown.deductions))
    .bind(Json(&breakdown.overtimes))
    .bind(Json(&breakdown.loans))
    .bind(totals.total_allowances)
    .bind(totals.total_deductions)
    .bind(totals.total_overtime)
    .bind(totals.total_loans)
    .bind(totals.gross_pay)
    .bind(totals.net_pay)
    .bind(PayrollStatus::Draft.as_ref())
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(
        payroll_entry_id = id,
        employee_id = payload.employee_id,
        net_pay = totals.net_pay,
        "Payroll entry created"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Payroll entry created successfully",
        "id": id,
        "totals": totals,
    })))
}

#[utoipa::path(
    put,
    path = "/api/hrm/payroll-entries/{payroll_entry_id}",
    request_body = UpdatePayrollEntry,
    params(("payroll_entry_id" = u64, Path, description = "Payroll entry ID")),
    responses(
        (status = 200, description = "Payroll entry updated and totals recomputed", body = PayrollTotals),
        (status = 404, description = "Payroll entry not found"),
        (status = 409, description = "Paid entries are immutable")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn update_payroll_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayrollEntry>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-payroll-entries")?;
    let payroll_entry_id = path.into_inner();
    let body = body.into_inner();

    let mut tx = pool.begin().await?;
    let current = fetch_for_update(&mut tx, payroll_entry_id).await?;

    ensure_draft(&current.status, "changed")?;

    let pay_period_start = body.pay_period_start.unwrap_or(current.pay_period_start);
    let pay_period_end = body.pay_period_end.unwrap_or(current.pay_period_end);
    validate_period(pay_period_start, pay_period_end)?;

    let breakdown = PayrollBreakdown {
        basic_salary: body.basic_salary.unwrap_or(current.basic_salary),
        allowances: body.allowances.unwrap_or(current.allowances.0),
        deductions: body.deductions.unwrap_or(current.deductions.0),
        overtimes: body.overtimes.unwrap_or(current.overtimes.0),
        loans: body.loans.unwrap_or(current.loans.0),
    };
    let totals = breakdown.totals()?;

    sqlx::query(
        r#"
        UPDATE payroll_entries
        SET pay_period_start = ?, pay_period_end = ?, basic_salary = ?,
            allowances = ?, deductions = ?, overtimes = ?, loans = ?,
            total_allowances = ?, total_deductions = ?, total_overtime = ?, total_loans = ?,
            gross_pay = ?, net_pay = ?
        WHERE id = ?
        "#,
    )
    .bind(pay_period_start)
    .bind(pay_period_end)
    .bind(breakdown.basic_salary)
    .bind(Json(&breakdown.allowances))
    .bind(Json(&breakdown.deductions))
    .bind(Json(&breakdown.overtimes))
    .bind(Json(&breakdown.loans))
    .bind(totals.total_allowances)
    .bind(totals.total_deductions)
    .bind(totals.total_overtime)
    .bind(totals.total_loans)
    .bind(totals.gross_pay)
    .bind(totals.net_pay)
    .bind(payroll_entry_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payroll entry updated successfully",
        "totals": totals,
    })))
}

#[utoipa::path(
    get,
    path = "/api/hrm/payroll-entries/{payroll_entry_id}",
    params(("payroll_entry_id" = u64, Path, description = "Payroll entry ID")),
    responses(
        (status = 200, body = PayrollEntry),
        (status = 404, description = "Payroll entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn get_payroll_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-payroll-entries")?;
    let payroll_entry_id = path.into_inner();

    let entry = sqlx::query_as::<_, PayrollEntry>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payroll_entries WHERE id = ?"
    ))
    .bind(payroll_entry_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Payroll entry"))?;

    if !auth.can("manage-payroll-entries") && auth.employee_id != Some(entry.employee_id) {
        return Err(ApiError::NotFound("Payroll entry"));
    }

    Ok(HttpResponse::Ok().json(entry))
}

#[utoipa::path(
    get,
    path = "/api/hrm/payroll-entries",
    params(PayrollQuery),
    responses((status = 200, body = PayrollEntryPage)),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn list_payroll_entries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-payroll-entries")?;
    let employee_id = visible_employee(&auth, query.employee_id, "manage-payroll-entries")?;

    let filter = Filter::new()
        .eq("employee_id", employee_id)
        .eq("status", query.status.as_deref())
        .on_or_after("pay_period_start", query.period_from)
        .on_or_before("pay_period_end", query.period_to);
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<PayrollEntry>(
        pool.get_ref(),
        PAYROLL_COLUMNS,
        "payroll_entries",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    delete,
    path = "/api/hrm/payroll-entries/{payroll_entry_id}",
    params(("payroll_entry_id" = u64, Path, description = "Payroll entry ID")),
    responses(
        (status = 200, description = "Payroll entry deleted"),
        (status = 404, description = "Payroll entry not found"),
        (status = 409, description = "Paid entries cannot be deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn delete_payroll_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-payroll-entries")?;
    let payroll_entry_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let current = fetch_for_update(&mut tx, payroll_entry_id).await?;
    ensure_draft(&current.status, "deleted")?;

    sqlx::query("DELETE FROM payroll_entries WHERE id = ?")
        .bind(payroll_entry_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(message("Successfully deleted"))
}

#[utoipa::path(
    put,
    path = "/api/hrm/payroll-entries/{payroll_entry_id}/pay",
    params(("payroll_entry_id" = u64, Path, description = "Payroll entry ID")),
    responses(
        (status = 200, description = "Payroll entry marked as paid"),
        (status = 404, description = "Payroll entry not found"),
        (status = 409, description = "Payroll entry already paid")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn pay_payroll_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("pay-payroll-entries")?;
    let payroll_entry_id = path.into_inner();

    let mut conn = pool.acquire().await?;
    apply_transition(
        &mut conn,
        "payroll_entries",
        "Payroll entry",
        payroll_entry_id,
        PayrollStatus::Paid,
        Stamp {
            approved_by: None,
            timestamp_column: Some("paid_at"),
        },
    )
    .await?;

    info!(payroll_entry_id, by = auth.user_id, "Payroll entry paid");
    Ok(message("Payroll entry marked as paid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_defaults_breakdowns_to_empty() {
        let payload: CreatePayrollEntry = serde_json::from_value(serde_json::json!({
            "employee_id": 4,
            "pay_period_start": "2026-01-01",
            "pay_period_end": "2026-01-31"
        }))
        .unwrap();
        assert!(payload.basic_salary.is_none());
        assert!(payload.allowances.is_empty());
        assert!(payload.overtimes.is_empty());
    }

    #[test]
    fn period_must_be_ordered() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(validate_period(start, end).is_err());
        assert!(validate_period(end, start).is_ok());
    }

    #[test]
    fn paid_entries_are_immutable() {
        assert!(ensure_draft(PayrollStatus::Draft.as_ref(), "changed").is_ok());
        assert!(matches!(
            ensure_draft(PayrollStatus::Paid.as_ref(), "changed"),
            Err(ApiError::Conflict(m)) if m == "Paid payroll entries cannot be changed"
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn locked_paid_entry_rejects_edits(pool: MySqlPool) {
        let employee_id = sqlx::query(
            "INSERT INTO employees (employee_code, first_name, last_name, email, hire_date) \
             VALUES ('EMP-1', 'Ada', 'Stone', 'ada@example.com', '2025-01-01')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_id();
        let entry_id = sqlx::query(
            "INSERT INTO payroll_entries \
             (employee_id, pay_period_start, pay_period_end, allowances, deductions, overtimes, loans, status) \
             VALUES (?, '2026-01-01', '2026-01-31', '[]', '[]', '[]', '[]', 'paid')",
        )
        .bind(employee_id)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_id();

        let mut tx = pool.begin().await.unwrap();
        let entry = fetch_for_update(&mut tx, entry_id).await.unwrap();
        assert!(matches!(
            ensure_draft(&entry.status, "changed"),
            Err(ApiError::Conflict(_))
        ));
    }
}
