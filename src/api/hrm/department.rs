use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{check_required_text_field, created, message, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::hrm::Department,
    utils::{
        db_utils::{delete_by_id, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

const UPDATABLE: [&str; 2] = ["name", "description"];
const SORTABLE: [(&str, &str); 2] = [("id", "id"), ("name", "name")];

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Finance")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Search by name
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/hrm/departments",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Paginated department list", body = DepartmentPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn list_departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DepartmentQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-departments")?;

    let filter = Filter::new().search(&["name", "description"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);
    let page = fetch_page::<Department>(
        pool.get_ref(),
        "id, name, description, created_at",
        "departments",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/hrm/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Department name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> ApiResult<HttpResponse> {
    auth.require("create-departments")?;
    let name = required_text("name", &payload.name)?;

    let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(name)
        .bind(payload.description.as_deref())
        .execute(pool.get_ref())
        .await?;

    Ok(created("Department", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/hrm/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn get_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-departments")?;
    let department_id = path.into_inner();

    let department = sqlx::query_as::<_, Department>(
        "SELECT id, name, description, created_at FROM departments WHERE id = ?",
    )
    .bind(department_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Department"))?;

    Ok(HttpResponse::Ok().json(department))
}

#[utoipa::path(
    put,
    path = "/api/hrm/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Department updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-departments")?;
    check_required_text_field(&body, "name")?;

    update_by_id(
        pool.get_ref(),
        "departments",
        path.into_inner(),
        &body,
        &UPDATABLE,
        "Department",
    )
    .await?;

    Ok(message("Department updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/hrm/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Hrm"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-departments")?;
    delete_by_id(pool.get_ref(), "departments", path.into_inner(), "Department").await?;
    Ok(message("Successfully deleted"))
}
