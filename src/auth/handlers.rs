use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{ApiError, ApiResult},
    model::role::Role,
    models::{Claims, LoginReqDto, TokenType, UserReq, UserSql},
    utils::permission_cache,
};
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

fn token_error(e: jsonwebtoken::errors::Error) -> ApiError {
    ApiError::Internal(format!("token encoding failed: {e}"))
}

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_username_available(username: &str, pool: &MySqlPool) -> ApiResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(username.to_lowercase())
    .fetch_one(pool)
    .await?;

    Ok(!exists)
}

/// Self-registration always creates a plain employee account; elevated
/// roles are granted by an administrator.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "message": "User registered successfully"
        })),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Role not allowed for self-registration"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    user: web::Json<UserReq>,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    let username = user.username.trim().to_lowercase();

    if username.is_empty() || user.password.is_empty() {
        return Err(ApiError::validation(
            "Username and password must not be empty",
        ));
    }
    if user.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role_id = self_service_role(user.role_id)?;

    if !is_username_available(&username, pool.get_ref()).await? {
        return Err(ApiError::conflict("Username already taken"));
    }

    let hashed = hash_password(&user.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    sqlx::query(r#"INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)"#)
        .bind(&username)
        .bind(hashed)
        .bind(role_id)
        .execute(pool.get_ref())
        .await?;

    info!(username = %username, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully"
    })))
}

fn self_service_role(requested: Option<u8>) -> ApiResult<u8> {
    match requested {
        None => Ok(Role::Employee.id()),
        Some(id) if id == Role::Employee.id() => Ok(id),
        Some(_) => Err(ApiError::Forbidden(
            "Only employee accounts can self-register".into(),
        )),
    }
}

async fn subject_for(pool: &MySqlPool, user: &UserSql) -> ApiResult<TokenSubject> {
    let permissions = permission_cache::permissions_for_role(pool, user.role_id).await?;
    Ok(TokenSubject {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role_id,
        employee_id: user.employee_id,
        permissions: permissions.as_ref().clone(),
    })
}

async fn store_refresh_token<'e, E>(executor: E, claims: &Claims) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims.user_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(executor)
    .await
    .map(|_| ())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::validation("Username or password required"));
    }

    debug!("Fetching user from database");

    // 2️⃣ Fetch user
    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(user.username.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await?;

    let db_user = match db_user {
        Some(u) if u.is_active => u,
        Some(_) => {
            info!("Login refused: account disabled");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    // 4️⃣ Resolve role grants and issue tokens
    let subject = subject_for(pool.get_ref(), &db_user).await?;
    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;

    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(pool.get_ref(), &refresh_claims).await?;

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    }))
}

#[get("/me")]
pub async fn me(auth: crate::auth::auth::AuthUser) -> HttpResponse {
    let mut permissions: Vec<&String> = auth.permissions.iter().collect();
    permissions.sort();
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "role": auth.role.as_ref(),
        "employee_id": auth.employee_id,
        "permissions": permissions,
    }))
}

fn refresh_claims_from(req: &HttpRequest, config: &Config) -> ApiResult<Claims> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("No token".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid token".into()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Refresh token required".into()));
    }
    Ok(claims)
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = LoginResponse),
        (status = 401, description = "Refresh token invalid, revoked or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let claims = refresh_claims_from(&req, &config)?;

    let mut tx = pool.begin().await?;

    // 🔍 find refresh token in DB
    let record = sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        FOR UPDATE
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(&mut *tx)
    .await?;

    let (record_id, user_id) = match record {
        Some((id, user_id, false)) => (id, user_id),
        _ => return Err(ApiError::Unauthorized("Refresh token revoked".into())),
    };

    // 🔥 revoke old refresh token
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(&mut *tx)
        .await?;

    // role or status may have changed since the last token
    let user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id, is_active
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .filter(|u| u.is_active)
    .ok_or_else(|| ApiError::Unauthorized("Account disabled".into()))?;

    let subject = subject_for(pool.get_ref(), &user).await?;

    // 🔄 issue new refresh token
    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;
    store_refresh_token(&mut *tx, &new_claims).await?;

    tx.commit().await?;

    // 🎫 new access token
    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(token_error)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Refresh token revoked (idempotent)")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    // only refresh tokens can logout
    let claims = match refresh_claims_from(&req, &config) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // revoke refresh token (idempotent)
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    // success (even if token didn't exist)
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_optional_on_registration() {
        let req: UserReq = serde_json::from_value(json!({
            "username": "jane.doe",
            "password": "s3cret-pass"
        }))
        .unwrap();
        assert_eq!(req.role_id, None);
        assert_eq!(self_service_role(req.role_id).unwrap(), Role::Employee.id());
    }

    #[test]
    fn only_the_employee_role_can_be_requested() {
        assert_eq!(
            self_service_role(Some(Role::Employee.id())).unwrap(),
            Role::Employee.id()
        );
        assert!(matches!(
            self_service_role(Some(Role::Admin.id())),
            Err(ApiError::Forbidden(_))
        ));
    }
}
