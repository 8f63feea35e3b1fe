use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::lead::LeadStage,
};

/// Pipeline stages in display order.
#[utoipa::path(
    get,
    path = "/api/lead/lead-stages",
    responses((status = 200, description = "Lead pipeline stages", body = [LeadStage])),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn list_lead_stages(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    auth.require("view-lead-stages")?;

    let stages = sqlx::query_as::<_, LeadStage>(
        "SELECT id, name, sort_order FROM lead_stages ORDER BY sort_order, id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(stages))
}

#[utoipa::path(
    get,
    path = "/api/lead/lead-stages/{stage_id}",
    params(("stage_id" = u64, Path, description = "Lead stage ID")),
    responses(
        (status = 200, body = LeadStage),
        (status = 404, description = "Lead stage not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn get_lead_stage(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-lead-stages")?;

    let stage = sqlx::query_as::<_, LeadStage>(
        "SELECT id, name, sort_order FROM lead_stages WHERE id = ?",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Lead stage"))?;

    Ok(HttpResponse::Ok().json(stage))
}
