use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{created, hrm::leave_request::visible_employee, message},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::performance::{CycleStatus, PerformanceReview, ReviewStatus, validate_rating},
    utils::{
        db_utils::{delete_by_id, ensure_exists},
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const REVIEW_COLUMNS: &str = "id, review_cycle_id, employee_id, reviewer_id, review_date, rating, \
     comments, status, created_at";

const SORTABLE: [(&str, &str); 3] = [
    ("review_date", "review_date"),
    ("id", "id"),
    ("rating", "rating"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateReview {
    #[schema(example = 1)]
    pub review_cycle_id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    /// Defaults to the caller
    pub reviewer_id: Option<u64>,
    #[schema(example = "2026-06-30")]
    pub review_date: NaiveDate,
    #[schema(example = 4)]
    pub rating: Option<u8>,
    pub comments: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReview {
    pub reviewer_id: Option<u64>,
    pub review_date: Option<NaiveDate>,
    pub rating: Option<u8>,
    pub comments: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteReview {
    #[schema(example = 4)]
    pub rating: u8,
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub review_cycle_id: Option<u64>,
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    /// Search in the comments
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

async fn fetch(pool: &MySqlPool, id: u64) -> ApiResult<PerformanceReview> {
    sqlx::query_as::<_, PerformanceReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM performance_reviews WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("Performance review"))
}

#[utoipa::path(
    get,
    path = "/api/performance/reviews",
    params(ReviewQuery),
    responses((status = 200, description = "Paginated reviews", body = PerformanceReviewPage)),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn list_reviews(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReviewQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-reviews")?;
    let employee_id = visible_employee(&auth, query.employee_id, "manage-reviews")?;

    let filter = Filter::new()
        .eq("review_cycle_id", query.review_cycle_id)
        .eq("employee_id", employee_id)
        .eq("status", query.status.as_deref())
        .search(&["comments"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<PerformanceReview>(
        pool.get_ref(),
        REVIEW_COLUMNS,
        "performance_reviews",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/performance/reviews",
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review scheduled"),
        (status = 400, description = "Invalid rating"),
        (status = 404, description = "Review cycle or employee not found"),
        (status = 409, description = "Review cycle is inactive")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn create_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateReview>,
) -> ApiResult<HttpResponse> {
    auth.require("create-reviews")?;
    let rating = payload.rating.map(validate_rating).transpose()?;

    let cycle_status = sqlx::query_scalar::<_, String>("SELECT status FROM review_cycles WHERE id = ?")
        .bind(payload.review_cycle_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or(ApiError::NotFound("Review cycle"))?;
    if cycle_status != CycleStatus::Active.as_ref() {
        return Err(ApiError::conflict("Review cycle is not active"));
    }
    ensure_exists(pool.get_ref(), "employees", payload.employee_id, "Employee").await?;

    let result = sqlx::query(
        r#"
        INSERT INTO performance_reviews
        (review_cycle_id, employee_id, reviewer_id, review_date, rating, comments, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.review_cycle_id)
    .bind(payload.employee_id)
    .bind(payload.reviewer_id.unwrap_or(auth.user_id))
    .bind(payload.review_date)
    .bind(rating)
    .bind(payload.comments.as_deref())
    .bind(ReviewStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Performance review", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/performance/reviews/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn get_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-reviews")?;
    let review = fetch(pool.get_ref(), path.into_inner()).await?;

    if !auth.can("manage-reviews") && auth.employee_id != Some(review.employee_id) {
        return Err(ApiError::NotFound("Performance review"));
    }

    Ok(HttpResponse::Ok().json(review))
}

#[utoipa::path(
    put,
    path = "/api/performance/reviews/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated"),
        (status = 400, description = "Invalid rating"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Completed reviews are read-only")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn update_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateReview>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-reviews")?;
    let current = fetch(pool.get_ref(), path.into_inner()).await?;

    if current.status == ReviewStatus::Completed.as_ref() {
        return Err(ApiError::conflict("Completed reviews cannot be changed"));
    }
    let rating = match payload.rating {
        Some(rating) => Some(validate_rating(rating)?),
        None => current.rating,
    };

    let result = sqlx::query(
        r#"
        UPDATE performance_reviews
        SET reviewer_id = ?, review_date = ?, rating = ?, comments = ?
        WHERE id = ? AND status <> ?
        "#,
    )
    .bind(payload.reviewer_id.or(current.reviewer_id))
    .bind(payload.review_date.unwrap_or(current.review_date))
    .bind(rating)
    .bind(payload.comments.as_deref().or(current.comments.as_deref()))
    .bind(current.id)
    .bind(ReviewStatus::Completed.as_ref())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        // either unchanged values or completed in the meantime
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM performance_reviews WHERE id = ?",
        )
        .bind(current.id)
        .fetch_optional(pool.get_ref())
        .await?;
        if status.as_deref() == Some(ReviewStatus::Completed.as_ref()) {
            return Err(ApiError::conflict("Completed reviews cannot be changed"));
        }
    }

    Ok(message("Review updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/performance/reviews/{review_id}",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn delete_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-reviews")?;
    delete_by_id(
        pool.get_ref(),
        "performance_reviews",
        path.into_inner(),
        "Performance review",
    )
    .await?;
    Ok(message("Successfully deleted"))
}

#[utoipa::path(
    put,
    path = "/api/performance/reviews/{review_id}/start",
    params(("review_id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review started"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn start_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-reviews")?;

    let mut conn = pool.acquire().await?;
    apply_transition(
        &mut conn,
        "performance_reviews",
        "Performance review",
        path.into_inner(),
        ReviewStatus::InProgress,
        Stamp::default(),
    )
    .await?;

    Ok(message("Review started"))
}

/// Completing a review records the final rating.
#[utoipa::path(
    put,
    path = "/api/performance/reviews/{review_id}/complete",
    params(("review_id" = u64, Path, description = "Review ID")),
    request_body = CompleteReview,
    responses(
        (status = 200, description = "Review completed"),
        (status = 400, description = "Rating must be between 1 and 5"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review is not in progress")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn complete_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CompleteReview>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-reviews")?;
    let review_id = path.into_inner();
    let rating = validate_rating(payload.rating)?;

    let mut tx = pool.begin().await?;
    apply_transition(
        &mut tx,
        "performance_reviews",
        "Performance review",
        review_id,
        ReviewStatus::Completed,
        Stamp::default(),
    )
    .await?;

    sqlx::query(
        "UPDATE performance_reviews SET rating = ?, comments = COALESCE(?, comments) WHERE id = ?",
    )
    .bind(rating)
    .bind(payload.comments.as_deref())
    .bind(review_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(review_id, rating, by = auth.user_id, "Performance review completed");

    Ok(message("Review completed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_requires_a_rating() {
        let missing = serde_json::from_value::<CompleteReview>(serde_json::json!({}));
        assert!(missing.is_err());

        let payload: CompleteReview =
            serde_json::from_value(serde_json::json!({"rating": 5, "comments": "Great"})).unwrap();
        assert_eq!(validate_rating(payload.rating).unwrap(), 5);
    }
}
