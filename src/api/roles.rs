use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    api::message,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::{
        permission::{self, PermissionRow},
        role::{Role, RoleRow},
    },
    utils::permission_cache,
};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RolePermissions {
    #[schema(example = json!(["view-vendors", "create-vendors"]))]
    pub permissions: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PermissionGroup {
    #[schema(example = "account")]
    pub module: String,
    pub permissions: Vec<PermissionRow>,
}

/// Deduplicates the requested grants and rejects names outside the catalogue.
fn normalize_grants(requested: &[String]) -> Result<BTreeSet<&str>, ApiError> {
    let mut grants = BTreeSet::new();
    for name in requested {
        let name = name.trim();
        if !permission::exists(name) {
            return Err(ApiError::validation(format!("Unknown permission: {name}")));
        }
        grants.insert(name);
    }
    Ok(grants)
}

async fn role_exists(pool: &MySqlPool, role_id: u8) -> ApiResult<()> {
    let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE id = ?)")
        .bind(role_id)
        .fetch_one(pool)
        .await?;
    if found {
        Ok(())
    } else {
        Err(ApiError::NotFound("Role"))
    }
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "All roles", body = [RoleRow])),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn list_roles(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    auth.require("view-roles")?;

    let roles = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(roles))
}

#[utoipa::path(
    get,
    path = "/api/roles/{role_id}/permissions",
    params(("role_id" = u8, Path, description = "Role ID")),
    responses(
        (status = 200, body = RolePermissions),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn get_role_permissions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u8>,
) -> ApiResult<HttpResponse> {
    auth.require("view-roles")?;
    let role_id = path.into_inner();

    role_exists(pool.get_ref(), role_id).await?;
    let permissions = permission_cache::permissions_for_role(pool.get_ref(), role_id).await?;

    Ok(HttpResponse::Ok().json(RolePermissions {
        permissions: permissions.as_ref().clone(),
    }))
}

/// Replaces a role's grants wholesale.
///
/// Tokens already issued keep their embedded permissions until they expire.
#[utoipa::path(
    put,
    path = "/api/roles/{role_id}/permissions",
    params(("role_id" = u8, Path, description = "Role ID")),
    request_body = RolePermissions,
    responses(
        (status = 200, description = "Grants replaced"),
        (status = 400, description = "Unknown permission"),
        (status = 404, description = "Role not found"),
        (status = 409, description = "The admin role always holds every permission")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn update_role_permissions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u8>,
    payload: web::Json<RolePermissions>,
) -> ApiResult<HttpResponse> {
    auth.require("manage-roles")?;
    let role_id = path.into_inner();

    if Role::from_id(role_id) == Some(Role::Admin) {
        return Err(ApiError::conflict("Admin permissions cannot be changed"));
    }
    let grants = normalize_grants(&payload.permissions)?;
    role_exists(pool.get_ref(), role_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM role_has_permissions WHERE role_id = ?")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

    for name in &grants {
        sqlx::query(
            r#"
            INSERT INTO role_has_permissions (role_id, permission_id)
            SELECT ?, id FROM permissions WHERE name = ?
            "#,
        )
        .bind(role_id)
        .bind(*name)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    permission_cache::invalidate(role_id).await;
    info!(role_id, grants = grants.len(), by = auth.user_id, "Role permissions replaced");

    Ok(message("Role permissions updated"))
}

/// The permission catalogue grouped by module
#[utoipa::path(
    get,
    path = "/api/permissions",
    responses((status = 200, body = [PermissionGroup])),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn list_permissions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    auth.require("view-roles")?;

    let rows = sqlx::query_as::<_, PermissionRow>(
        "SELECT id, name, module FROM permissions ORDER BY module, id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let mut grouped: BTreeMap<String, Vec<PermissionRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.module.clone()).or_default().push(row);
    }
    let groups: Vec<PermissionGroup> = grouped
        .into_iter()
        .map(|(module, permissions)| PermissionGroup {
            module,
            permissions,
        })
        .collect();

    Ok(HttpResponse::Ok().json(groups))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/roles").route(web::get().to(list_roles)))
        .service(
            web::resource("/roles/{id}/permissions")
                .route(web::get().to(get_role_permissions))
                .route(web::put().to(update_role_permissions)),
        )
        .service(web::resource("/permissions").route(web::get().to(list_permissions)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_deduplicated() {
        let requested = vec![
            "view-vendors".to_string(),
            " view-vendors ".to_string(),
            "create-vendors".to_string(),
        ];
        let grants = normalize_grants(&requested).unwrap();
        assert_eq!(grants.len(), 2);
    }

    #[test]
    fn unknown_grants_are_rejected() {
        let requested = vec!["view-vendors".to_string(), "fly-planes".to_string()];
        assert!(matches!(
            normalize_grants(&requested),
            Err(ApiError::Validation(m)) if m.contains("fly-planes")
        ));
    }
}
