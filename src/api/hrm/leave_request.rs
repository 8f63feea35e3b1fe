use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{created, message},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::hrm::{LeaveRequest, LeaveStatus, LeaveType},
    utils::{
        db_utils::ensure_exists,
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, leave_type, reason, status, approved_by, created_at";

const SORTABLE: [(&str, &str); 3] = [
    ("created_at", "created_at"),
    ("start_date", "start_date"),
    ("id", "id"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Defaults to the caller's own employee record
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03")]
    pub end_date: NaiveDate,
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<String>,
    /// Filter by leave type
    pub leave_type: Option<String>,
    /// Leaves starting on or after this date
    pub from: Option<NaiveDate>,
    /// Leaves ending on or before this date
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

/// Employee a request is filed for: self-service unless the caller manages leaves.
pub(crate) fn target_employee(
    auth: &AuthUser,
    requested: Option<u64>,
    manage_permission: &str,
) -> Result<u64, ApiError> {
    match requested {
        Some(id) if auth.employee_id == Some(id) => Ok(id),
        Some(id) => auth.require(manage_permission).map(|_| id),
        None => auth.own_employee_id(),
    }
}

/// Employee scope for reads: managers see everything, others only themselves.
pub(crate) fn visible_employee(
    auth: &AuthUser,
    requested: Option<u64>,
    manage_permission: &str,
) -> Result<Option<u64>, ApiError> {
    if auth.can(manage_permission) {
        Ok(requested)
    } else {
        auth.own_employee_id().map(Some)
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/hrm/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully"),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> ApiResult<HttpResponse> {
    auth.require("create-leaves")?;
    let employee_id = target_employee(&auth, payload.employee_id, "manage-leaves")?;

    // 1️⃣ validate dates
    if payload.start_date > payload.end_date {
        return Err(ApiError::validation("start_date cannot be after end_date"));
    }

    ensure_exists(pool.get_ref(), "employees", employee_id, "Employee").await?;

    // 2️⃣ insert request
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, leave_type, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.as_ref())
    .bind(payload.reason.as_deref())
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Leave request", result.last_insert_id()))
}

async fn decide(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    target: LeaveStatus,
) -> ApiResult<HttpResponse> {
    auth.require("approve-leaves")?;

    let mut conn = pool.acquire().await?;
    apply_transition(
        &mut conn,
        "leave_requests",
        "Leave request",
        leave_id,
        target,
        Stamp {
            approved_by: Some(auth.user_id),
            timestamp_column: None,
        },
    )
    .await?;

    tracing::info!(leave_id, status = %target, by = auth.user_id, "Leave decided");
    Ok(message(format!("Leave {target}")))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/hrm/leaves/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    decide(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/hrm/leaves/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    decide(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Rejected).await
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/hrm/leaves/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-leaves")?;
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Leave request"))?;

    if !auth.can("manage-leaves") && auth.employee_id != Some(leave.employee_id) {
        return Err(ApiError::NotFound("Leave request"));
    }

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/hrm/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeavePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> ApiResult<HttpResponse> {
    auth.require("view-leaves")?;
    let employee_id = visible_employee(&auth, query.employee_id, "manage-leaves")?;

    let filter = Filter::new()
        .eq("employee_id", employee_id)
        .eq("status", query.status.as_deref())
        .eq("leave_type", query.leave_type.as_deref())
        .on_or_after("start_date", query.from)
        .on_or_before("end_date", query.to);
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<LeaveRequest>(
        pool.get_ref(),
        LEAVE_COLUMNS,
        "leave_requests",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Withdraw a leave request that has not been decided yet
#[utoipa::path(
    delete,
    path = "/api/hrm/leaves/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request deleted"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-leaves")?;
    let leave_id = path.into_inner();

    let owner = sqlx::query_as::<_, (u64, String)>(
        "SELECT employee_id, status FROM leave_requests WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let (employee_id, status) = match owner {
        Some(row) => row,
        None => return Err(ApiError::NotFound("Leave request")),
    };
    if !auth.can("manage-leaves") && auth.employee_id != Some(employee_id) {
        return Err(ApiError::NotFound("Leave request"));
    }
    if status != LeaveStatus::Pending.as_ref() {
        return Err(ApiError::conflict("Only pending leave requests can be deleted"));
    }

    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND status = ?")
        .bind(leave_id)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(pool.get_ref())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Leave request already processed"));
    }

    Ok(message("Successfully deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::tests::user_with;

    #[test]
    fn self_service_targets_own_record() {
        let user = user_with(&["create-leaves"]);
        assert_eq!(target_employee(&user, None, "manage-leaves").unwrap(), 10);
        assert_eq!(target_employee(&user, Some(10), "manage-leaves").unwrap(), 10);
        assert!(matches!(
            target_employee(&user, Some(11), "manage-leaves"),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn managers_may_file_for_others() {
        let user = user_with(&["create-leaves", "manage-leaves"]);
        assert_eq!(target_employee(&user, Some(11), "manage-leaves").unwrap(), 11);
    }

    #[test]
    fn non_managers_only_see_themselves() {
        let user = user_with(&["view-leaves"]);
        assert_eq!(visible_employee(&user, Some(99), "manage-leaves").unwrap(), Some(10));

        let manager = user_with(&["view-leaves", "manage-leaves"]);
        assert_eq!(visible_employee(&manager, None, "manage-leaves").unwrap(), None);
        assert_eq!(visible_employee(&manager, Some(99), "manage-leaves").unwrap(), Some(99));
    }
}
