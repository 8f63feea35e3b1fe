use crate::auth::auth::authenticate;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use tracing::debug;

/// Rejects requests without a valid access token and stores the
/// resulting `AuthUser` in the request extensions for handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let auth_user = match authenticate(req.request()) {
        Ok(user) => user,
        Err(e) => {
            debug!(path = %req.path(), reason = %e, "Rejected unauthenticated request");
            return Ok(req.into_response(e.error_response()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
