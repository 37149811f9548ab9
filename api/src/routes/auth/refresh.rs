use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use kw_core::repositories::{TokenRepository, UserRepository};

use crate::dto::auth::{AccessTokenResponse, RefreshRequest};
use crate::handlers::{handle_domain_error, validation_error_response};
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/refresh
///
/// Mints a new access token; the refresh token itself is not rotated.
///
/// # Request Body
///
/// ```json
/// { "refresh": "eyJ..." }
/// ```
///
/// ## Errors
/// - 400 Bad Request: `refresh` missing or empty
/// - 401 Unauthorized: Invalid, expired, revoked or unknown refresh token
pub async fn refresh<U, T>(
    state: web::Data<AppState<U, T>>,
    request: web::Json<RefreshRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state.auth_service.refresh(&request.refresh, Utc::now()).await {
        Ok(access) => HttpResponse::Ok().json(AccessTokenResponse::from(access)),
        Err(error) => handle_domain_error(error),
    }
}
