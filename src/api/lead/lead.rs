use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{check_required_text_field, created, message, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::lead::Lead,
    utils::{
        db_utils::{delete_by_id, ensure_exists, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

const LEAD_SELECT: &str = "l.id, l.name, l.email, l.phone, l.subject, l.company, l.stage_id, \
     s.name AS stage_name, l.owner_id, l.follow_up_date, l.is_converted, l.notes, l.created_at";

const LEAD_FROM: &str = "leads l LEFT JOIN lead_stages s ON s.id = l.stage_id";

// stage and conversion have their own endpoints
const UPDATABLE: [&str; 8] = [
    "name",
    "email",
    "phone",
    "subject",
    "company",
    "owner_id",
    "follow_up_date",
    "notes",
];

const SORTABLE: [(&str, &str); 4] = [
    ("id", "l.id"),
    ("name", "l.name"),
    ("follow_up_date", "l.follow_up_date"),
    ("created_at", "l.created_at"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateLead {
    #[schema(example = "Maria Lopez")]
    pub name: String,
    #[schema(example = "maria@contoso.example")]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "ERP rollout for 40 seats")]
    pub subject: String,
    pub company: Option<String>,
    /// Defaults to the first pipeline stage
    pub stage_id: Option<u64>,
    /// Defaults to the caller
    pub owner_id: Option<u64>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MoveStage {
    #[schema(example = 3)]
    pub stage_id: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub stage_id: Option<u64>,
    pub owner_id: Option<u64>,
    pub is_converted: Option<bool>,
    /// Search by name, email, subject or company
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

async fn fetch(pool: &MySqlPool, id: u64) -> ApiResult<Lead> {
    sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_SELECT} FROM {LEAD_FROM} WHERE l.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Lead"))
}

#[utoipa::path(
    get,
    path = "/api/lead/leads",
    params(LeadQuery),
    responses((status = 200, description = "Paginated lead list", body = LeadPage)),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn list_leads(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeadQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-leads")?;

    let filter = Filter::new()
        .eq("l.stage_id", query.stage_id)
        .eq("l.owner_id", query.owner_id)
        .eq("l.is_converted", query.is_converted)
        .search(
            &["l.name", "l.email", "l.subject", "l.company"],
            query.search.as_deref(),
        );
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Lead>(
        pool.get_ref(),
        LEAD_SELECT,
        LEAD_FROM,
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/lead/leads",
    request_body = CreateLead,
    responses(
        (status = 201, description = "Lead created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Lead stage not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn create_lead(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLead>,
) -> ApiResult<HttpResponse> {
    auth.require("create-leads")?;

    let name = required_text("name", &payload.name)?;
    let subject = required_text("subject", &payload.subject)?;

    let stage_id = match payload.stage_id {
        Some(stage_id) => {
            ensure_exists(pool.get_ref(), "lead_stages", stage_id, "Lead stage").await?;
            Some(stage_id)
        }
        None => {
            sqlx::query_scalar::<_, u64>(
                "SELECT id FROM lead_stages ORDER BY sort_order, id LIMIT 1",
            )
            .fetch_optional(pool.get_ref())
            .await?
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leads
        (name, email, phone, subject, company, stage_id, owner_id, follow_up_date, is_converted, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)
        "#,
    )
    .bind(name)
    .bind(payload.email.as_deref())
    .bind(payload.phone.as_deref())
    .bind(subject)
    .bind(payload.company.as_deref())
    .bind(stage_id)
    .bind(payload.owner_id.unwrap_or(auth.user_id))
    .bind(payload.follow_up_date)
    .bind(payload.notes.as_deref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Lead", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/lead/leads/{lead_id}",
    params(("lead_id" = u64, Path, description = "Lead ID")),
    responses(
        (status = 200, body = Lead),
        (status = 404, description = "Lead not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn get_lead(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-leads")?;
    let lead = fetch(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(lead))
}

#[utoipa::path(
    put,
    path = "/api/lead/leads/{lead_id}",
    params(("lead_id" = u64, Path, description = "Lead ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Lead updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Lead not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn update_lead(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-leads")?;
    check_required_text_field(&body, "name")?;
    check_required_text_field(&body, "subject")?;

    update_by_id(
        pool.get_ref(),
        "leads",
        path.into_inner(),
        &body,
        &UPDATABLE,
        "Lead",
    )
    .await?;

    Ok(message("Lead updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/lead/leads/{lead_id}",
    params(("lead_id" = u64, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Lead deleted"),
        (status = 404, description = "Lead not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn delete_lead(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-leads")?;
    delete_by_id(pool.get_ref(), "leads", path.into_inner(), "Lead").await?;
    Ok(message("Successfully deleted"))
}

/// Moves a lead to another pipeline stage
#[utoipa::path(
    put,
    path = "/api/lead/leads/{lead_id}/stage",
    params(("lead_id" = u64, Path, description = "Lead ID")),
    request_body = MoveStage,
    responses(
        (status = 200, description = "Lead moved"),
        (status = 404, description = "Lead or stage not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn move_lead_stage(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<MoveStage>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-leads")?;
    let lead_id = path.into_inner();

    ensure_exists(pool.get_ref(), "lead_stages", payload.stage_id, "Lead stage").await?;

    let result = sqlx::query("UPDATE leads SET stage_id = ? WHERE id = ?")
        .bind(payload.stage_id)
        .bind(lead_id)
        .execute(pool.get_ref())
        .await?;
    if result.rows_affected() == 0 {
        ensure_exists(pool.get_ref(), "leads", lead_id, "Lead").await?;
    }

    Ok(message("Lead stage updated"))
}

/// Marks a lead as converted; a lead converts only once.
#[utoipa::path(
    put,
    path = "/api/lead/leads/{lead_id}/convert",
    params(("lead_id" = u64, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Lead converted"),
        (status = 404, description = "Lead not found"),
        (status = 409, description = "Lead already converted")
    ),
    security(("bearer_auth" = [])),
    tag = "Lead"
)]
pub async fn convert_lead(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("convert-leads")?;
    let lead_id = path.into_inner();

    let result = sqlx::query("UPDATE leads SET is_converted = TRUE WHERE id = ? AND is_converted = FALSE")
        .bind(lead_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        ensure_exists(pool.get_ref(), "leads", lead_id, "Lead").await?;
        return Err(ApiError::conflict("Lead is already converted"));
    }

    info!(lead_id, by = auth.user_id, "Lead converted");
    Ok(message("Lead converted"))
}
