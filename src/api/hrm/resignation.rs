use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::leave_request::{target_employee, visible_employee};
use crate::{
    api::{created, message},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::hrm::{EmployeeStatus, Resignation, ResignationStatus},
    utils::{
        db_utils::ensure_exists,
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const RESIGNATION_COLUMNS: &str = "id, employee_id, resignation_date, last_working_date, reason, \
     status, approved_by, created_at";

const SORTABLE: [(&str, &str); 3] = [
    ("id", "id"),
    ("resignation_date", "resignation_date"),
    ("last_working_date", "last_working_date"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateResignation {
    /// Defaults to the caller's own employee record
    pub employee_id: Option<u64>,
    #[schema(example = "2026-03-01")]
    pub resignation_date: NaiveDate,
    #[schema(example = "2026-03-31")]
    pub last_working_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateResignation {
    pub resignation_date: Option<NaiveDate>,
    pub last_working_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResignationQuery {
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    /// Search in the reason text
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

fn validate_dates(resignation_date: NaiveDate, last_working_date: NaiveDate) -> Result<(), ApiError> {
    if last_working_date < resignation_date {
        return Err(ApiError::validation(
            "last_working_date cannot be before resignation_date",
        ));
    }
    Ok(())
}

async fn fetch(pool: &MySqlPool, id: u64) -> ApiResult<Resignation> {
    sqlx::query_as::<_, Resignation>(&format!(
        "SELECT {RESIGNATION_COLUMNS} FROM resignations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("Resignation"))
}

/// Locks the row for the rest of the transaction.
async fn fetch_for_update(conn: &mut MySqlConnection, id: u64) -> ApiResult<Resignation> {
    sqlx::query_as::<_, Resignation>(&format!(
        "SELECT {RESIGNATION_COLUMNS} FROM resignations WHERE id = ? FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ApiError::NotFound("Resignation"))
}

/// Decided resignations are kept as the record behind the employee's status.
fn ensure_pending(resignation: &Resignation, action: &str) -> Result<(), ApiError> {
    if resignation.status != ResignationStatus::Pending.as_ref() {
        return Err(ApiError::conflict(format!(
            "Only pending resignations can be {action}"
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/hrm/resignations",
    params(ResignationQuery),
    responses((status = 200, description = "Paginated resignation list", body = ResignationPage)),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn list_resignations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ResignationQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-resignations")?;
    let employee_id = visible_employee(&auth, query.employee_id, "manage-resignations")?;

    let filter = Filter::new()
        .eq("employee_id", employee_id)
        .eq("status", query.status.as_deref())
        .search(&["reason"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Resignation>(
        pool.get_ref(),
        RESIGNATION_COLUMNS,
        "resignations",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/hrm/resignations",
    request_body = CreateResignation,
    responses(
        (status = 201, description = "Resignation submitted"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "A pending resignation already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn create_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateResignation>,
) -> ApiResult<HttpResponse> {
    auth.require("create-resignations")?;
    let employee_id = target_employee(&auth, payload.employee_id, "manage-resignations")?;
    validate_dates(payload.resignation_date, payload.last_working_date)?;

    ensure_exists(pool.get_ref(), "employees", employee_id, "Employee").await?;

    let pending = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM resignations WHERE employee_id = ? AND status = ?)",
    )
    .bind(employee_id)
    .bind(ResignationStatus::Pending.as_ref())
    .fetch_one(pool.get_ref())
    .await?;
    if pending {
        return Err(ApiError::conflict(
            "Employee already has a pending resignation",
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO resignations
            (employee_id, resignation_date, last_working_date, reason, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.resignation_date)
    .bind(payload.last_working_date)
    .bind(payload.reason.as_deref())
    .bind(ResignationStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Resignation", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/hrm/resignations/{resignation_id}",
    params(("resignation_id" = u64, Path, description = "Resignation ID")),
    responses(
        (status = 200, description = "Resignation found", body = Resignation),
        (status = 404, description = "Resignation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn get_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-resignations")?;
    let resignation = fetch(pool.get_ref(), path.into_inner()).await?;

    if !auth.can("manage-resignations") && auth.employee_id != Some(resignation.employee_id) {
        return Err(ApiError::NotFound("Resignation"));
    }

    Ok(HttpResponse::Ok().json(resignation))
}

#[utoipa::path(
    put,
    path = "/api/hrm/resignations/{resignation_id}",
    params(("resignation_id" = u64, Path, description = "Resignation ID")),
    request_body = UpdateResignation,
    responses(
        (status = 200, description = "Resignation updated"),
        (status = 404, description = "Resignation not found"),
        (status = 409, description = "Resignation already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn update_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateResignation>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-resignations")?;

    let mut tx = pool.begin().await?;
    let current = fetch_for_update(&mut tx, path.into_inner()).await?;

    if !auth.can("manage-resignations") && auth.employee_id != Some(current.employee_id) {
        return Err(ApiError::NotFound("Resignation"));
    }
    ensure_pending(&current, "edited")?;

    let resignation_date = payload.resignation_date.unwrap_or(current.resignation_date);
    let last_working_date = payload.last_working_date.unwrap_or(current.last_working_date);
    validate_dates(resignation_date, last_working_date)?;
    let reason = payload.reason.as_deref().or(current.reason.as_deref());

    sqlx::query(
        r#"
        UPDATE resignations
        SET resignation_date = ?, last_working_date = ?, reason = ?
        WHERE id = ?
        "#,
    )
    .bind(resignation_date)
    .bind(last_working_date)
    .bind(reason)
    .bind(current.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(message("Resignation updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/hrm/resignations/{resignation_id}",
    params(("resignation_id" = u64, Path, description = "Resignation ID")),
    responses(
        (status = 200, description = "Resignation deleted"),
        (status = 404, description = "Resignation not found"),
        (status = 409, description = "Resignation already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn delete_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-resignations")?;

    let mut tx = pool.begin().await?;
    let current = fetch_for_update(&mut tx, path.into_inner()).await?;

    if !auth.can("manage-resignations") && auth.employee_id != Some(current.employee_id) {
        return Err(ApiError::NotFound("Resignation"));
    }
    ensure_pending(&current, "deleted")?;

    sqlx::query("DELETE FROM resignations WHERE id = ?")
        .bind(current.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(message("Successfully deleted"))
}

/// Accepting a resignation also terminates the employee, atomically.
#[utoipa::path(
    put,
    path = "/api/hrm/resignations/{resignation_id}/accept",
    params(("resignation_id" = u64, Path, description = "Resignation ID")),
    responses(
        (status = 200, description = "Resignation accepted"),
        (status = 404, description = "Resignation not found"),
        (status = 409, description = "Resignation already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn accept_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("approve-resignations")?;
    let resignation_id = path.into_inner();

    let mut tx = pool.begin().await?;
    apply_transition(
        &mut tx,
        "resignations",
        "Resignation",
        resignation_id,
        ResignationStatus::Accepted,
        Stamp {
            approved_by: Some(auth.user_id),
            timestamp_column: None,
        },
    )
    .await?;

    sqlx::query(
        r#"
        UPDATE employees e
        JOIN resignations r ON r.employee_id = e.id
        SET e.status = ?
        WHERE r.id = ?
        "#,
    )
    .bind(EmployeeStatus::Terminated.as_ref())
    .bind(resignation_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(resignation_id, by = auth.user_id, "Resignation accepted");

    Ok(message("Resignation accepted"))
}

#[utoipa::path(
    put,
    path = "/api/hrm/resignations/{resignation_id}/reject",
    params(("resignation_id" = u64, Path, description = "Resignation ID")),
    responses(
        (status = 200, description = "Resignation rejected"),
        (status = 404, description = "Resignation not found"),
        (status = 409, description = "Resignation already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn reject_resignation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("approve-resignations")?;

    let mut conn = pool.acquire().await?;
    apply_transition(
        &mut conn,
        "resignations",
        "Resignation",
        path.into_inner(),
        ResignationStatus::Rejected,
        Stamp {
            approved_by: Some(auth.user_id),
            timestamp_column: None,
        },
    )
    .await?;

    Ok(message("Resignation rejected"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_working_date_must_follow_resignation_date() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(validate_dates(d(1), d(31)).is_ok());
        assert!(validate_dates(d(1), d(1)).is_ok());
        assert!(validate_dates(d(10), d(9)).is_err());
    }

    fn resignation(status: ResignationStatus) -> Resignation {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        Resignation {
            id: 1,
            employee_id: 10,
            resignation_date: d(1),
            last_working_date: d(31),
            reason: None,
            status: status.as_ref().to_string(),
            approved_by: None,
            created_at: None,
        }
    }

    #[test]
    fn only_pending_resignations_change() {
        assert!(ensure_pending(&resignation(ResignationStatus::Pending), "edited").is_ok());
        for decided in [ResignationStatus::Accepted, ResignationStatus::Rejected] {
            assert!(matches!(
                ensure_pending(&resignation(decided), "deleted"),
                Err(ApiError::Conflict(m)) if m.contains("deleted")
            ));
        }
    }
}
