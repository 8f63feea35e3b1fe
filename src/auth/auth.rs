use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub permissions: HashSet<String>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }
        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
            permissions: claims.permissions.into_iter().collect(),
        })
    }

    pub fn can(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Fails with 403 unless the token grants `permission`.
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Missing permission: {permission}"
            )))
        }
    }

    /// The caller's own employee id, for self-service actions.
    pub fn own_employee_id(&self) -> Result<u64, ApiError> {
        self.employee_id
            .ok_or_else(|| ApiError::Forbidden("No employee profile".into()))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding".into()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Authorization header must start with Bearer".into()))
}

/// Verifies the bearer access token on `req` against the configured secret.
pub(crate) fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let token = bearer_token(req)?;
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ApiError::Internal("Config missing".into()))?;
    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    AuthUser::from_claims(claims)
}

fn extract(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    // set by auth_middleware on protected scopes
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }
    authenticate(req)
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user_with(permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".into(),
            role: Role::Hr,
            employee_id: Some(10),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn require_checks_granted_permissions() {
        let user = user_with(&["create-vendors"]);
        assert!(user.require("create-vendors").is_ok());
        assert!(matches!(
            user.require("delete-vendors"),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn refresh_claims_are_not_accepted_as_access() {
        let claims = Claims {
            user_id: 1,
            sub: "tester".into(),
            role: 1,
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Refresh,
            employee_id: None,
            permissions: vec![],
        };
        assert!(matches!(
            AuthUser::from_claims(claims),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn missing_employee_profile_is_forbidden() {
        let mut user = user_with(&[]);
        user.employee_id = None;
        assert!(matches!(user.own_employee_id(), Err(ApiError::Forbidden(_))));
    }
}
