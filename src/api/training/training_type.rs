use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::training::TrainingType,
};

#[utoipa::path(
    get,
    path = "/api/training/training-types",
    responses((status = 200, description = "All training types", body = [TrainingType])),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn list_training_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    auth.require("view-training-types")?;

    let types = sqlx::query_as::<_, TrainingType>(
        "SELECT id, name, description FROM training_types ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    get,
    path = "/api/training/training-types/{training_type_id}",
    params(("training_type_id" = u64, Path, description = "Training type ID")),
    responses(
        (status = 200, body = TrainingType),
        (status = 404, description = "Training type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn get_training_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-training-types")?;

    let training_type = sqlx::query_as::<_, TrainingType>(
        "SELECT id, name, description FROM training_types WHERE id = ?",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Training type"))?;

    Ok(HttpResponse::Ok().json(training_type))
}
