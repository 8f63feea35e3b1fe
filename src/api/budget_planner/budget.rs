use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{created, message, non_negative, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::budget::{
        Budget, BudgetAllocation, BudgetDetail, BudgetStatus, BudgetSummary, check_allocation_fits,
        validate_period,
    },
    utils::{
        db_utils::ensure_exists,
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const BUDGET_COLUMNS: &str =
    "id, budget_name, period_start, period_end, total_budget, status, approved_by, created_by, created_at";

const ALLOCATION_SELECT: &str = r#"
    SELECT a.id, a.budget_id, a.account_id, c.account_code, c.account_name,
           a.allocated_amount, a.spent_amount
    FROM budget_allocations a
    LEFT JOIN chart_of_accounts c ON c.id = a.account_id
    WHERE a.budget_id = ?
    ORDER BY a.id
"#;

const SORTABLE: [(&str, &str); 4] = [
    ("period_start", "period_start"),
    ("id", "id"),
    ("budget_name", "budget_name"),
    ("total_budget", "total_budget"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateBudget {
    #[schema(example = "FY2026 Operations")]
    pub budget_name: String,
    #[schema(example = "2026-01-01")]
    pub period_start: NaiveDate,
    #[schema(example = "2026-12-31")]
    pub period_end: NaiveDate,
    #[schema(example = 250000.0)]
    pub total_budget: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBudget {
    pub budget_name: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_budget: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAllocation {
    #[schema(example = 12)]
    pub account_id: u64,
    #[schema(example = 40000.0)]
    pub allocated_amount: f64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BudgetQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    /// Search by budget name
    pub search: Option<String>,
    /// Budgets starting on or after this date
    pub period_from: Option<NaiveDate>,
    /// Budgets ending on or before this date
    pub period_to: Option<NaiveDate>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

async fn lock_budget(conn: &mut MySqlConnection, id: u64) -> ApiResult<Budget> {
    sqlx::query_as::<_, Budget>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ? FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ApiError::NotFound("Budget"))
}

fn ensure_draft(budget: &Budget) -> Result<(), ApiError> {
    if budget.status != BudgetStatus::Draft.as_ref() {
        return Err(ApiError::conflict(format!(
            "Budget is {} and can no longer be changed",
            budget.status
        )));
    }
    Ok(())
}

async fn allocation_totals(conn: &mut MySqlConnection, budget_id: u64) -> Result<(f64, f64), sqlx::Error> {
    sqlx::query_as::<_, (f64, f64)>(
        r#"
        SELECT CAST(COALESCE(SUM(allocated_amount), 0) AS DOUBLE),
               CAST(COALESCE(SUM(spent_amount), 0) AS DOUBLE)
        FROM budget_allocations WHERE budget_id = ?
        "#,
    )
    .bind(budget_id)
    .fetch_one(conn)
    .await
}

#[utoipa::path(
    get,
    path = "/api/budget-planner/budgets",
    params(BudgetQuery),
    responses((status = 200, description = "Paginated budget list", body = BudgetPage)),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn list_budgets(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BudgetQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-budgets")?;

    let filter = Filter::new()
        .eq("status", query.status.as_deref())
        .on_or_after("period_start", query.period_from)
        .on_or_before("period_end", query.period_to)
        .search(&["budget_name"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Budget>(
        pool.get_ref(),
        BUDGET_COLUMNS,
        "budgets",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/budget-planner/budgets",
    request_body = CreateBudget,
    responses(
        (status = 201, description = "Budget created as draft"),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn create_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateBudget>,
) -> ApiResult<HttpResponse> {
    auth.require("create-budgets")?;

    let budget_name = required_text("budget_name", &payload.budget_name)?;
    validate_period(payload.period_start, payload.period_end)?;
    let total_budget = non_negative("total_budget", payload.total_budget)?;

    let result = sqlx::query(
        r#"
        INSERT INTO budgets
        (budget_name, period_start, period_end, total_budget, status, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(budget_name)
    .bind(payload.period_start)
    .bind(payload.period_end)
    .bind(total_budget)
    .bind(BudgetStatus::Draft.as_ref())
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    Ok(created("Budget", result.last_insert_id()))
}

/// Budget with its allocations and a spending summary.
#[utoipa::path(
    get,
    path = "/api/budget-planner/budgets/{budget_id}",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, body = BudgetDetail),
        (status = 404, description = "Budget not found")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn get_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-budgets")?;
    let budget_id = path.into_inner();

    let budget = sqlx::query_as::<_, Budget>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?"
    ))
    .bind(budget_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Budget"))?;

    let allocations = sqlx::query_as::<_, BudgetAllocation>(ALLOCATION_SELECT)
        .bind(budget_id)
        .fetch_all(pool.get_ref())
        .await?;

    let allocated: f64 = allocations.iter().map(|a| a.allocated_amount).sum();
    let spent: f64 = allocations.iter().map(|a| a.spent_amount).sum();
    let summary = BudgetSummary::new(budget.total_budget, allocated, spent);

    Ok(HttpResponse::Ok().json(BudgetDetail {
        budget,
        summary,
        allocations,
    }))
}

#[utoipa::path(
    put,
    path = "/api/budget-planner/budgets/{budget_id}",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    request_body = UpdateBudget,
    responses(
        (status = 200, description = "Budget updated"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Only draft budgets can be edited")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn update_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateBudget>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-budgets")?;
    let budget_id = path.into_inner();
    let payload = payload.into_inner();

    let mut tx = pool.begin().await?;
    let current = lock_budget(&mut tx, budget_id).await?;
    ensure_draft(&current)?;

    let budget_name = match payload.budget_name {
        Some(name) => required_text("budget_name", &name)?,
        None => current.budget_name,
    };
    let period_start = payload.period_start.unwrap_or(current.period_start);
    let period_end = payload.period_end.unwrap_or(current.period_end);
    validate_period(period_start, period_end)?;

    let total_budget = non_negative(
        "total_budget",
        payload.total_budget.unwrap_or(current.total_budget),
    )?;
    let (allocated, _) = allocation_totals(&mut tx, budget_id).await?;
    if total_budget < allocated {
        return Err(ApiError::validation(format!(
            "total_budget cannot be below the allocated amount of {allocated:.2}"
        )));
    }

    sqlx::query(
        r#"
        UPDATE budgets
        SET budget_name = ?, period_start = ?, period_end = ?, total_budget = ?
        WHERE id = ?
        "#,
    )
    .bind(budget_name)
    .bind(period_start)
    .bind(period_end)
    .bind(total_budget)
    .bind(budget_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(message("Budget updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/budget-planner/budgets/{budget_id}",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget deleted with its allocations"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Only draft budgets can be deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn delete_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-budgets")?;
    let budget_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let current = lock_budget(&mut tx, budget_id).await?;
    ensure_draft(&current)?;

    sqlx::query("DELETE FROM budgets WHERE id = ?")
        .bind(budget_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(message("Successfully deleted"))
}

async fn transition(
    pool: &MySqlPool,
    budget_id: u64,
    target: BudgetStatus,
    stamp: Stamp,
) -> ApiResult<HttpResponse> {
    let mut conn = pool.acquire().await?;
    apply_transition(&mut conn, "budgets", "Budget", budget_id, target, stamp).await?;
    info!(budget_id, status = %target, "Budget status changed");
    Ok(message(format!("Budget {target}")))
}

#[utoipa::path(
    put,
    path = "/api/budget-planner/budgets/{budget_id}/approve",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget approved"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn approve_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("approve-budgets")?;
    let stamp = Stamp {
        approved_by: Some(auth.user_id),
        timestamp_column: None,
    };
    transition(pool.get_ref(), path.into_inner(), BudgetStatus::Approved, stamp).await
}

#[utoipa::path(
    put,
    path = "/api/budget-planner/budgets/{budget_id}/activate",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget activated"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is not approved")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn activate_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-budgets")?;
    transition(pool.get_ref(), path.into_inner(), BudgetStatus::Active, Stamp::default()).await
}

#[utoipa::path(
    put,
    path = "/api/budget-planner/budgets/{budget_id}/close",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget closed"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is not active")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn close_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-budgets")?;
    transition(pool.get_ref(), path.into_inner(), BudgetStatus::Closed, Stamp::default()).await
}

#[utoipa::path(
    get,
    path = "/api/budget-planner/budgets/{budget_id}/allocations",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    responses(
        (status = 200, body = [BudgetAllocation]),
        (status = 404, description = "Budget not found")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn list_allocations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-budgets")?;
    let budget_id = path.into_inner();

    ensure_exists(pool.get_ref(), "budgets", budget_id, "Budget").await?;
    let allocations = sqlx::query_as::<_, BudgetAllocation>(ALLOCATION_SELECT)
        .bind(budget_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(allocations))
}

/// Allocates part of a draft budget to one account.
#[utoipa::path(
    post,
    path = "/api/budget-planner/budgets/{budget_id}/allocations",
    params(("budget_id" = u64, Path, description = "Budget ID")),
    request_body = CreateAllocation,
    responses(
        (status = 201, description = "Allocation added"),
        (status = 400, description = "Allocation exceeds the budget"),
        (status = 404, description = "Budget or account not found"),
        (status = 409, description = "Budget is not a draft or account already allocated")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn add_allocation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateAllocation>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-budgets")?;
    let budget_id = path.into_inner();

    let mut tx = pool.begin().await?;

    // 1️⃣ lock the budget so concurrent allocations see each other
    let budget = lock_budget(&mut tx, budget_id).await?;
    ensure_draft(&budget)?;

    // 2️⃣ account must exist
    let account_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM chart_of_accounts WHERE id = ?)",
    )
    .bind(payload.account_id)
    .fetch_one(&mut *tx)
    .await?;
    if !account_exists {
        return Err(ApiError::NotFound("Account"));
    }

    // 3️⃣ stay within the total
    let (allocated, _) = allocation_totals(&mut tx, budget_id).await?;
    check_allocation_fits(budget.total_budget, allocated, payload.allocated_amount)?;

    let result = sqlx::query(
        r#"
        INSERT INTO budget_allocations (budget_id, account_id, allocated_amount, spent_amount)
        VALUES (?, ?, ?, 0)
        "#,
    )
    .bind(budget_id)
    .bind(payload.account_id)
    .bind(payload.allocated_amount)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(created("Allocation", result.last_insert_id()))
}

#[utoipa::path(
    delete,
    path = "/api/budget-planner/budgets/{budget_id}/allocations/{allocation_id}",
    params(
        ("budget_id" = u64, Path, description = "Budget ID"),
        ("allocation_id" = u64, Path, description = "Allocation ID")
    ),
    responses(
        (status = 200, description = "Allocation removed"),
        (status = 404, description = "Budget or allocation not found"),
        (status = 409, description = "Budget is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "BudgetPlanner"
)]
pub async fn delete_allocation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-budgets")?;
    let (budget_id, allocation_id) = path.into_inner();

    let mut tx = pool.begin().await?;
    let budget = lock_budget(&mut tx, budget_id).await?;
    ensure_draft(&budget)?;

    let result = sqlx::query("DELETE FROM budget_allocations WHERE id = ? AND budget_id = ?")
        .bind(allocation_id)
        .bind(budget_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Allocation"));
    }

    tx.commit().await?;
    Ok(message("Successfully deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(status: BudgetStatus) -> Budget {
        Budget {
            id: 1,
            budget_name: "Ops".into(),
            period_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            total_budget: 1000.0,
            status: status.as_ref().to_string(),
            approved_by: None,
            created_by: Some(1),
            created_at: None,
        }
    }

    #[test]
    fn only_drafts_are_editable() {
        assert!(ensure_draft(&budget(BudgetStatus::Draft)).is_ok());
        for status in [BudgetStatus::Approved, BudgetStatus::Active, BudgetStatus::Closed] {
            assert!(matches!(
                ensure_draft(&budget(status)),
                Err(ApiError::Conflict(_))
            ));
        }
    }

    #[test]
    fn detail_flattens_budget_fields() {
        let detail = BudgetDetail {
            budget: budget(BudgetStatus::Draft),
            summary: BudgetSummary::new(1000.0, 400.0, 50.0),
            allocations: Vec::new(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["budget_name"], "Ops");
        assert_eq!(json["summary"]["unallocated"], 600.0);
        assert_eq!(json["summary"]["remaining"], 350.0);
    }
}
