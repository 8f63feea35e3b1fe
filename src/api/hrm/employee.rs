use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        check_enum_field, check_non_negative_field, check_required_text_field, created, message,
        non_negative, required_text,
    },
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::hrm::{Employee, EmployeeStatus},
    utils::{
        db_utils::{delete_by_id, ensure_exists, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, phone, \
     department_id, designation, hire_date, basic_salary, status";

const UPDATABLE: [&str; 10] = [
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "department_id",
    "designation",
    "hire_date",
    "basic_salary",
    "status",
];

const SORTABLE: [(&str, &str); 5] = [
    ("id", "id"),
    ("employee_code", "employee_code"),
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("hire_date", "hire_date"),
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-3000")]
    pub employee_code: String,
    #[schema(example = "Amina")]
    pub first_name: String,
    #[schema(example = "Rahman")]
    pub last_name: String,
    #[schema(example = "amina@company.com", format = "email")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[schema(example = "Payroll Officer")]
    pub designation: Option<String>,
    #[schema(example = "2026-01-01")]
    pub hire_date: NaiveDate,
    #[schema(example = 42000.0)]
    pub basic_salary: Option<f64>,
    pub status: Option<EmployeeStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department_id: Option<u64>,
    pub status: Option<String>,
    /// Search by name, email or employee code
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LinkUser {
    #[schema(example = 12)]
    pub user_id: u64,
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = required_text("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::validation("email must be a valid address")),
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/hrm/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": 7
        })),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require("create-employees")?;

    let employee_code = required_text("employee_code", &payload.employee_code)?;
    let first_name = required_text("first_name", &payload.first_name)?;
    let last_name = required_text("last_name", &payload.last_name)?;
    let email = validate_email(&payload.email)?;
    let basic_salary = non_negative("basic_salary", payload.basic_salary.unwrap_or(0.0))?;
    let status = payload.status.unwrap_or(EmployeeStatus::Active);

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department_id, designation,
         hire_date, basic_salary, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_code)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(payload.phone.as_deref())
    .bind(payload.department_id)
    .bind(payload.designation.as_deref())
    .bind(payload.hire_date)
    .bind(basic_salary)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Employee", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/hrm/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeePage)
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-employees")?;

    let filter = Filter::new()
        .eq("department_id", query.department_id)
        .eq("status", query.status.as_deref())
        .search(
            &["first_name", "last_name", "email", "employee_code"],
            query.search.as_deref(),
        );
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Employee>(
        pool.get_ref(),
        EMPLOYEE_COLUMNS,
        "employees",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/hrm/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-employees")?;

    check_enum_field::<EmployeeStatus>(&body, "status")?;
    check_non_negative_field(&body, "basic_salary")?;
    for field in ["employee_code", "first_name", "last_name"] {
        check_required_text_field(&body, field)?;
    }
    if let Some(email) = body.get("email") {
        validate_email(email.as_str().unwrap_or_default())?;
    }

    update_by_id(
        pool.get_ref(),
        "employees",
        path.into_inner(),
        &body,
        &UPDATABLE,
        "Employee",
    )
    .await?;

    Ok(message("Employee updated successfully"))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/hrm/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-employees")?;
    let employee_id = path.into_inner();

    delete_by_id(pool.get_ref(), "employees", employee_id, "Employee").await?;
    info!(employee_id, deleted_by = auth.user_id, "Employee deleted");

    Ok(message("Successfully deleted"))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/hrm/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.into_inner();
    // employees may always read their own record
    if auth.employee_id != Some(employee_id) {
        auth.require("view-employees")?;
    }

    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Employee"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Link a login account to an employee record
#[utoipa::path(
    put,
    path = "/api/hrm/employees/{employee_id}/user",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = LinkUser,
    responses(
        (status = 200, description = "User linked"),
        (status = 404, description = "Employee or user not found")
    ),
    tag = "Hrm",
    security(("bearer_auth" = []))
)]
pub async fn link_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LinkUser>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-employees")?;
    let employee_id = path.into_inner();

    ensure_exists(pool.get_ref(), "employees", employee_id, "Employee").await?;

    let result = sqlx::query("UPDATE users SET employee_id = ? WHERE id = ?")
        .bind(employee_id)
        .bind(payload.user_id)
        .execute(pool.get_ref())
        .await?;
    if result.rows_affected() == 0 {
        ensure_exists(pool.get_ref(), "users", payload.user_id, "User").await?;
    }

    Ok(message("User linked to employee"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert_eq!(validate_email(" a@b.co ").unwrap(), "a@b.co");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@localhost").is_err());
    }
}
