use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{check_non_negative_field, check_required_text_field, created, message, non_negative, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::account::Vendor,
    utils::{
        db_utils::{delete_by_id, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

const VENDOR_COLUMNS: &str = "id, vendor_code, company_name, contact_person, email, phone, tax_number, \
     payment_terms, credit_limit, current_balance, is_active, created_at";

const UPDATABLE: [&str; 9] = [
    "vendor_code",
    "company_name",
    "contact_person",
    "email",
    "phone",
    "tax_number",
    "payment_terms",
    "credit_limit",
    "is_active",
];

const SORTABLE: [(&str, &str); 4] = [
    ("id", "id"),
    ("vendor_code", "vendor_code"),
    ("company_name", "company_name"),
    ("created_at", "created_at"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateVendor {
    #[schema(example = "VEN-0003")]
    pub vendor_code: String,
    #[schema(example = "Northwind Supplies")]
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_number: Option<String>,
    /// Days until payment is due
    #[schema(example = 30)]
    pub payment_terms: Option<u32>,
    #[schema(example = 10000.0)]
    pub credit_limit: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VendorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub is_active: Option<bool>,
    /// Search by code, company, contact or email
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/account/vendors",
    params(VendorQuery),
    responses((status = 200, description = "Paginated vendor list", body = VendorPage)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_vendors(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<VendorQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-vendors")?;

    let filter = Filter::new().eq("is_active", query.is_active).search(
        &["vendor_code", "company_name", "contact_person", "email"],
        query.search.as_deref(),
    );
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<Vendor>(
        pool.get_ref(),
        VENDOR_COLUMNS,
        "vendors",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/account/vendors",
    request_body = CreateVendor,
    responses(
        (status = 201, description = "Vendor created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Vendor code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn create_vendor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateVendor>,
) -> ApiResult<HttpResponse> {
    auth.require("create-vendors")?;

    let vendor_code = required_text("vendor_code", &payload.vendor_code)?;
    let company_name = required_text("company_name", &payload.company_name)?;
    let credit_limit = non_negative("credit_limit", payload.credit_limit.unwrap_or(0.0))?;

    let result = sqlx::query(
        r#"
        INSERT INTO vendors
        (vendor_code, company_name, contact_person, email, phone, tax_number,
         payment_terms, credit_limit, current_balance, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(vendor_code)
    .bind(company_name)
    .bind(payload.contact_person.as_deref())
    .bind(payload.email.as_deref())
    .bind(payload.phone.as_deref())
    .bind(payload.tax_number.as_deref())
    .bind(payload.payment_terms)
    .bind(credit_limit)
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await?;

    Ok(created("Vendor", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/account/vendors/{vendor_id}",
    params(("vendor_id" = u64, Path, description = "Vendor ID")),
    responses(
        (status = 200, body = Vendor),
        (status = 404, description = "Vendor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_vendor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-vendors")?;

    let vendor = sqlx::query_as::<_, Vendor>(&format!(
        "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?"
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Vendor"))?;

    Ok(HttpResponse::Ok().json(vendor))
}

#[utoipa::path(
    put,
    path = "/api/account/vendors/{vendor_id}",
    params(("vendor_id" = u64, Path, description = "Vendor ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Vendor updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Vendor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_vendor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-vendors")?;

    check_required_text_field(&body, "vendor_code")?;
    check_required_text_field(&body, "company_name")?;
    check_non_negative_field(&body, "credit_limit")?;
    check_non_negative_field(&body, "payment_terms")?;

    update_by_id(
        pool.get_ref(),
        "vendors",
        path.into_inner(),
        &body,
        &UPDATABLE,
        "Vendor",
    )
    .await?;

    Ok(message("Vendor updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/account/vendors/{vendor_id}",
    params(("vendor_id" = u64, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor deleted"),
        (status = 404, description = "Vendor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_vendor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-vendors")?;
    delete_by_id(pool.get_ref(), "vendors", path.into_inner(), "Vendor").await?;
    Ok(message("Successfully deleted"))
}
