use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{check_enum_field, check_required_text_field, created, message, required_text},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::account::{ChartOfAccount, NormalBalance, ancestor_chain, validate_parent},
    utils::{
        db_utils::{delete_by_id, ensure_exists, update_by_id},
        pagination::{Filter, Page, Sort, fetch_page},
    },
};

const ACCOUNT_COLUMNS: &str = "id, account_code, account_name, account_type_id, parent_account_id, \
     normal_balance, opening_balance, current_balance, is_active, description";

// balances are not writable through the generic update
const UPDATABLE: [&str; 7] = [
    "account_code",
    "account_name",
    "account_type_id",
    "parent_account_id",
    "normal_balance",
    "is_active",
    "description",
];

const SORTABLE: [(&str, &str); 3] = [
    ("account_code", "account_code"),
    ("account_name", "account_name"),
    ("id", "id"),
];

#[derive(Deserialize, ToSchema)]
pub struct CreateChartOfAccount {
    #[schema(example = "1010")]
    pub account_code: String,
    #[schema(example = "Cash on Hand")]
    pub account_name: String,
    #[schema(example = 1)]
    pub account_type_id: u64,
    pub parent_account_id: Option<u64>,
    /// Defaults to the account type's normal balance
    pub normal_balance: Option<NormalBalance>,
    #[schema(example = 500.0)]
    pub opening_balance: Option<f64>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartOfAccountQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub account_type_id: Option<u64>,
    pub parent_account_id: Option<u64>,
    pub is_active: Option<bool>,
    /// Search by code or name
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

/// Loads the hierarchy once and walks `parent_id`'s ancestors in memory.
async fn parent_chain(pool: &MySqlPool, parent_id: u64) -> ApiResult<Vec<u64>> {
    let parents: HashMap<u64, Option<u64>> = sqlx::query_as::<_, (u64, Option<u64>)>(
        "SELECT id, parent_account_id FROM chart_of_accounts",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    ancestor_chain(parent_id, |id| parents.get(&id).copied())
}

#[utoipa::path(
    get,
    path = "/api/account/chart-of-accounts",
    params(ChartOfAccountQuery),
    responses((status = 200, description = "Paginated chart of accounts", body = ChartOfAccountPage)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_chart_of_accounts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ChartOfAccountQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-chart-of-accounts")?;

    let filter = Filter::new()
        .eq("account_type_id", query.account_type_id)
        .eq("parent_account_id", query.parent_account_id)
        .eq("is_active", query.is_active)
        .search(&["account_code", "account_name"], query.search.as_deref());
    let sort = Sort::resolve(query.sort.as_deref(), query.direction.as_deref(), &SORTABLE);

    let page = fetch_page::<ChartOfAccount>(
        pool.get_ref(),
        ACCOUNT_COLUMNS,
        "chart_of_accounts",
        &filter,
        sort,
        Page::new(query.page, query.per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/account/chart-of-accounts",
    request_body = CreateChartOfAccount,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Validation failed or unknown parent"),
        (status = 404, description = "Account type not found"),
        (status = 409, description = "Account code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn create_chart_of_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateChartOfAccount>,
) -> ApiResult<HttpResponse> {
    auth.require("create-chart-of-accounts")?;

    let account_code = required_text("account_code", &payload.account_code)?;
    let account_name = required_text("account_name", &payload.account_name)?;
    let opening_balance = payload.opening_balance.unwrap_or(0.0);
    if !opening_balance.is_finite() {
        return Err(ApiError::validation("opening_balance must be a number"));
    }

    // 1️⃣ normal balance inherited from the account type
    let type_balance = sqlx::query_scalar::<_, String>(
        "SELECT normal_balance FROM account_types WHERE id = ?",
    )
    .bind(payload.account_type_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Account type"))?;
    let normal_balance = match payload.normal_balance {
        Some(balance) => balance.as_ref().to_string(),
        None => type_balance,
    };

    // 2️⃣ parent must exist; a new account cannot be anyone's ancestor yet
    if let Some(parent_id) = payload.parent_account_id {
        parent_chain(pool.get_ref(), parent_id).await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO chart_of_accounts
        (account_code, account_name, account_type_id, parent_account_id, normal_balance,
         opening_balance, current_balance, is_active, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(account_code)
    .bind(account_name)
    .bind(payload.account_type_id)
    .bind(payload.parent_account_id)
    .bind(normal_balance)
    .bind(opening_balance)
    .bind(opening_balance)
    .bind(payload.is_active.unwrap_or(true))
    .bind(payload.description.as_deref())
    .execute(pool.get_ref())
    .await?;

    Ok(created("Account", result.last_insert_id()))
}

#[utoipa::path(
    get,
    path = "/api/account/chart-of-accounts/{account_id}",
    params(("account_id" = u64, Path, description = "Account ID")),
    responses(
        (status = 200, body = ChartOfAccount),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_chart_of_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-chart-of-accounts")?;

    let account = sqlx::query_as::<_, ChartOfAccount>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM chart_of_accounts WHERE id = ?"
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Account"))?;

    Ok(HttpResponse::Ok().json(account))
}

#[utoipa::path(
    put,
    path = "/api/account/chart-of-accounts/{account_id}",
    params(("account_id" = u64, Path, description = "Account ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Account updated"),
        (status = 400, description = "Invalid field or parent would create a cycle"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_chart_of_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require("edit-chart-of-accounts")?;
    let account_id = path.into_inner();

    check_enum_field::<NormalBalance>(&body, "normal_balance")?;
    check_required_text_field(&body, "account_code")?;
    check_required_text_field(&body, "account_name")?;

    match body.get("parent_account_id") {
        None | Some(Value::Null) => {}
        Some(parent) => {
            let parent_id = parent
                .as_u64()
                .ok_or_else(|| ApiError::validation("parent_account_id must be an id"))?;
            ensure_exists(pool.get_ref(), "chart_of_accounts", account_id, "Account").await?;
            let chain = parent_chain(pool.get_ref(), parent_id).await?;
            validate_parent(Some(account_id), &chain)?;
        }
    }

    update_by_id(
        pool.get_ref(),
        "chart_of_accounts",
        account_id,
        &body,
        &UPDATABLE,
        "Account",
    )
    .await?;

    info!(account_id, by = auth.user_id, "Account updated");
    Ok(message("Account updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/account/chart-of-accounts/{account_id}",
    params(("account_id" = u64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Account is still referenced")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_chart_of_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("delete-chart-of-accounts")?;
    delete_by_id(pool.get_ref(), "chart_of_accounts", path.into_inner(), "Account").await?;
    Ok(message("Successfully deleted"))
}
