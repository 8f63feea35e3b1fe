use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{check_enum_field, check_required_text_field, created, message, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::performance::{CycleStatus, ReviewCycle, ReviewFrequency},
    utils::{
        db_utils::{delete_by_id, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

const CYCLE_COLUMNS: &str = "id, name, frequency, description, status, created_at";
const UPDATABLE: [&str; 4] = ["name", "frequency", "description", "status"];
const SORTABLE: [(&str, &str); 2] = [("id", "id"), ("name", "name")];

#[derive(Deserialize, ToSchema)]
pub struct CreateReviewCycle {
    #[schema(example = "2026 H1")]
    pub name: String,
    pub frequency: ReviewFrequency,
    pub description: Option<String>,
    pub status: Option<CycleStatus>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewCycleQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub frequency: Option<String>,
    /// Search by name
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/performance/review-cycles",
    params(ReviewCycleQuery),
    responses((status = 200, description = "Paginated review cycles", body = ReviewCyclePage)),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn list_review_cycles(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReviewCycleQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-review-cycles")?;

    let filter = Filter::new()
        .eq("status", query.status.as_deref())
        .eq("frequency", query.frequency.as_deref())
        .search(&["name", "description"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<ReviewCycle>(
        pool.get_ref(),
        CYCLE_COLUMNS,
        "review_cycles",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/performance/review-cycles",
    request_body = CreateReviewCycle,
    responses(
        (status = 201, description = "Review cycle created"),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn create_review_cycle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateReviewCycle>,
) -> ApiResult<HttpResponse> {
    auth.require("create-review-cycles")?;
    let name = required_text("name", &payload.name)?;

    let result = sqlx::query(
        "INSERT INTO review_cycles (name, frequency, description, status) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(payload.frequency.as_ref())
    .bind(payload.description.as_deref())
    .bind(payload.status.unwrap_or(CycleStatus::Active).as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Review cycle", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/performance/review-cycles/{cycle_id}",
    params(("cycle_id" = u64, Path, description = "Review cycle ID")),
    responses(
        (status = 200, body = ReviewCycle),
        (status = 404, description = "Review cycle not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn get_review_cycle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-review-cycles")?;

    let cycle = sqlx::query_as::<_, ReviewCycle>(&format!(
        "SELECT {CYCLE_COLUMNS} FROM review_cycles WHERE id = ?"
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Review cycle"))?;

    Ok(HttpResponse::Ok().json(cycle))
}

#[utoipa::path(
    put,
    path = "/api/performance/review-cycles/{cycle_id}",
    params(("cycle_id" = u64, Path, description = "Review cycle ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Review cycle updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Review cycle not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn update_review_cycle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-review-cycles")?;
    check_required_text_field(&body, "name")?;
    check_enum_field::<ReviewFrequency>(&body, "frequency")?;
    check_enum_field::<CycleStatus>(&body, "status")?;

    update_by_id(
        pool.get_ref(),
        "review_cycles",
        path.into_inner(),
        &body,
        &UPDATABLE,
        "Review cycle",
    )
    .await?;

    Ok(message("Review cycle updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/performance/review-cycles/{cycle_id}",
    params(("cycle_id" = u64, Path, description = "Review cycle ID")),
    responses(
        (status = 200, description = "Review cycle and its reviews deleted"),
        (status = 404, description = "Review cycle not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn delete_review_cycle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-review-cycles")?;
    delete_by_id(pool.get_ref(), "review_cycles", path.into_inner(), "Review cycle").await?;
    Ok(message("Successfully deleted"))
}
