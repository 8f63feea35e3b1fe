use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// Error returned by every handler; rendered as `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

// MySQL server error numbers for integrity violations.
const ER_DUP_ENTRY: u16 = 1062;
const ER_ROW_IS_REFERENCED_2: u16 = 1451;
const ER_NO_REFERENCED_ROW_2: u16 = 1452;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Classifies integrity violations so a duplicate or a dangling
    /// reference is reported to the caller instead of as a 500.
    fn integrity_violation(&self) -> Option<(StatusCode, &'static str)> {
        let ApiError::Database(sqlx::Error::Database(db_err)) = self else {
            return None;
        };
        let mysql_err = db_err.try_downcast_ref::<MySqlDatabaseError>()?;
        match mysql_err.number() {
            ER_DUP_ENTRY => Some((StatusCode::CONFLICT, "Record already exists")),
            ER_ROW_IS_REFERENCED_2 => Some((
                StatusCode::CONFLICT,
                "Record is still referenced by other records",
            )),
            ER_NO_REFERENCED_ROW_2 => {
                Some((StatusCode::BAD_REQUEST, "Referenced record does not exist"))
            }
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if let Some((status, _)) = self.integrity_violation() {
            return status;
        }
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match (self, self.integrity_violation()) {
            (_, Some((_, message))) => message.to_string(),
            (ApiError::Database(e), None) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            (ApiError::Internal(e), None) => {
                tracing::error!(error = %e, "Internal error");
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_variants() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("Vendor").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(ApiError::NotFound("Budget").to_string(), "Budget not found");
    }
}
