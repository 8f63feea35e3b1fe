use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

use crate::{
    api::parse_enum,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::account::{AccountCategory, AccountType},
};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccountTypeQuery {
    /// Restrict to one category (assets, liabilities, equity, revenue, expenses)
    pub category: Option<String>,
}

/// Account types are reference data installed by the seeders.
#[utoipa::path(
    get,
    path = "/api/account/account-types",
    params(AccountTypeQuery),
    responses(
        (status = 200, description = "All account types", body = [AccountType]),
        (status = 400, description = "Unknown category")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_account_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AccountTypeQuery>,
) -> ApiResult<HttpResponse> {
    auth.require("view-account-types")?;

    let types = match query.category.as_deref() {
        Some(category) => {
            let category = parse_enum::<AccountCategory>("category", category)?;
            sqlx::query_as::<_, AccountType>(
                "SELECT id, name, category, normal_balance FROM account_types WHERE category = ? ORDER BY id",
            )
            .bind(category.as_ref())
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, AccountType>(
                "SELECT id, name, category, normal_balance FROM account_types ORDER BY id",
            )
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    get,
    path = "/api/account/account-types/{account_type_id}",
    params(("account_type_id" = u64, Path, description = "Account type ID")),
    responses(
        (status = 200, body = AccountType),
        (status = 404, description = "Account type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_account_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require("view-account-types")?;

    let account_type = sqlx::query_as::<_, AccountType>(
        "SELECT id, name, category, normal_balance FROM account_types WHERE id = ?",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::NotFound("Account type"))?;

    Ok(HttpResponse::Ok().json(account_type))
}
