use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        check_non_negative_field, check_required_text_field, created, message, non_negative,
        hrm::leave_request::visible_employee, required_text,
    },
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::training::{Training, TrainingStatus},
    utils::{
        db_utils::{delete_by_id, ensure_exists, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
        workflow::{Stamp, apply_transition},
    },
};

const TRAINING_COLUMNS: &str = "id, title, training_type_id, trainer, employee_id, start_date, \
     end_date, cost, status, description, created_at";

// status moves only through the action endpoints
const UPDATABLE: [&str; 8] = [
    "title",
    "training_type_id",
    "trainer",
    "employee_id",
    "start_date",
    "end_date",
    "cost",
    "description",
];

const SORTABLE: [(&str, &str); 4] = [
    ("start_date", "start_date"),
    ("id", "id"),
    ("title", "title"),
    ("cost", "cost"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateTraining {
    #[schema(example = "Data protection essentials")]
    pub title: String,
    pub training_type_id: Option<u64>,
    #[schema(example = "J. Okafor")]
    pub trainer: Option<String>,
    pub employee_id: Option<u64>,
    #[schema(example = "2026-04-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-04-03")]
    pub end_date: NaiveDate,
    #[schema(example = 350.0)]
    pub cost: Option<f64>,
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrainingQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub training_type_id: Option<u64>,
    pub employee_id: Option<u64>,
    /// Search by title or trainer
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

fn validate_dates(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::validation("end_date cannot be before start_date"));
    }
    Ok(())
}

/// Reads a date key of a dynamic payload, if present.
fn payload_date(body: &Value, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} must be a YYYY-MM-DD date"))),
        Some(_) => Err(ApiError::validation(format!("{field} must be a YYYY-MM-DD date"))),
    }
}

#[utoipa::path(
    get,
    path = "/api/training/trainings",
    params(TrainingQuery),
    responses((status = 200, description = "Paginated trainings", body = TrainingPage)),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn list_trainings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TrainingQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-trainings")?;
    let employee_id = visible_employee(&auth, query.employee_id, "manage-trainings")?;

    let filter = Filter::new()
        .eq("status", query.status.as_deref())
        .eq("training_type_id", query.training_type_id)
        .eq("employee_id", employee_id)
        .search(&["title", "trainer"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Training>(
        pool.get_ref(),
        TRAINING_COLUMNS,
        "trainings",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/training/trainings",
    request_body = CreateTraining,
    responses(
        (status = 201, description = "Training scheduled"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Training type or employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn create_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTraining>,
) -> ApiResult<HttpResponse> {
    auth.require("create-trainings")?;

    let title = required_text("title", &payload.title)?;
    validate_dates(payload.start_date, payload.end_date)?;
    let cost = non_negative("cost", payload.cost.unwrap_or(0.0))?;

    if let Some(type_id) = payload.training_type_id {
        ensure_exists(pool.get_ref(), "training_types", type_id, "Training type").await?;
    }
    if let Some(employee_id) = payload.employee_id {
        ensure_exists(pool.get_ref(), "employees", employee_id, "Employee").await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO trainings
        (title, training_type_id, trainer, employee_id, start_date, end_date, cost, status, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(payload.training_type_id)
    .bind(payload.trainer.as_deref())
    .bind(payload.employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(cost)
    .bind(TrainingStatus::Pending.as_ref())
    .bind(payload.description.as_deref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Training", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/training/trainings/{training_id}",
    params(("training_id" = u64, Path, description = "Training ID")),
    responses(
        (status = 200, body = Training),
        (status = 404, description = "Training not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn get_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-trainings")?;

    let training = sqlx::query_as::<_, Training>(&format!(
        "SELECT {TRAINING_COLUMNS} FROM trainings WHERE id = ?"
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Training"))?;

    if !auth.can("manage-trainings")
        && (training.employee_id.is_none() || auth.employee_id != training.employee_id)
    {
        return Err(ApiError::NotFound("Training"));
    }

    Ok(HttpResponse::Ok().json(training))
}

#[utoipa::path(
    put,
    path = "/api/training/trainings/{training_id}",
    params(("training_id" = u64, Path, description = "Training ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Training updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Training not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn update_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-trainings")?;
    let training_id = path.into_inner();

    check_required_text_field(&body, "title")?;
    check_non_negative_field(&body, "cost")?;

    let start = payload_date(&body, "start_date")?;
    let end = payload_date(&body, "end_date")?;
    if start.is_some() || end.is_some() {
        let (current_start, current_end) = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
            "SELECT start_date, end_date FROM trainings WHERE id = ?",
        )
        .bind(training_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or(ApiError::NotFound("Training"))?;
        validate_dates(start.unwrap_or(current_start), end.unwrap_or(current_end))?;
    }

    update_by_id(
        pool.get_ref(),
        "trainings",
        training_id,
        &body,
        &UPDATABLE,
        "Training",
    )
    .await?;

    Ok(message("Training updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/training/trainings/{training_id}",
    params(("training_id" = u64, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Training deleted"),
        (status = 404, description = "Training not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn delete_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-trainings")?;
    delete_by_id(pool.get_ref(), "trainings", path.into_inner(), "Training").await?;
    Ok(message("Successfully deleted"))
}

async fn transition(
    auth: AuthUser,
    pool: &MySqlPool,
    training_id: u64,
    target: TrainingStatus,
) -> ApiResult<HttpResponse> {
    auth.require("edit-trainings")?;

    let mut conn = pool.acquire().await?;
    apply_transition(
        &mut conn,
        "trainings",
        "Training",
        training_id,
        target,
        Stamp::default(),
    )
    .await?;

    tracing::info!(training_id, status = %target, by = auth.user_id, "Training status changed");
    Ok(message(format!("Training {target}")))
}

#[utoipa::path(
    put,
    path = "/api/training/trainings/{training_id}/start",
    params(("training_id" = u64, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Training started"),
        (status = 404, description = "Training not found"),
        (status = 409, description = "Training is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn start_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    transition(auth, pool.get_ref(), path.into_inner(), TrainingStatus::Started).await
}

#[utoipa::path(
    put,
    path = "/api/training/trainings/{training_id}/complete",
    params(("training_id" = u64, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Training completed"),
        (status = 404, description = "Training not found"),
        (status = 409, description = "Training has not started")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn complete_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    transition(auth, pool.get_ref(), path.into_inner(), TrainingStatus::Completed).await
}

#[utoipa::path(
    put,
    path = "/api/training/trainings/{training_id}/terminate",
    params(("training_id" = u64, Path, description = "Training ID")),
    responses(
        (status = 200, description = "Training terminated"),
        (status = 404, description = "Training not found"),
        (status = 409, description = "Training already finished")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn terminate_training(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    transition(auth, pool.get_ref(), path.into_inner(), TrainingStatus::Terminated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_dates_are_parsed_or_rejected() {
        let body = json!({"start_date": "2026-04-01", "end_date": "04/03/2026"});
        assert_eq!(
            payload_date(&body, "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 1)
        );
        assert!(payload_date(&body, "end_date").is_err());
        assert_eq!(payload_date(&body, "missing").unwrap(), None);
    }

    #[test]
    fn end_date_must_not_precede_start() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        assert!(validate_dates(d(1), d(3)).is_ok());
        assert!(validate_dates(d(3), d(1)).is_err());
    }
}
