use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use kw_core::repositories::{TokenRepository, UserRepository};

use crate::dto::auth::{AuthResponse, LoginRequest};
use crate::handlers::{handle_domain_error, validation_error_response};
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/login
///
/// Unknown email and wrong password both answer
/// `401 {"error": "INVALID_CREDENTIALS", "message": "Invalid credentials"}`.
pub async fn login<U, T>(
    state: web::Data<AppState<U, T>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state
        .auth_service
        .login(&request.email, &request.password, Utc::now())
        .await
    {
        Ok((user, tokens)) => HttpResponse::Ok().json(AuthResponse {
            user: user.profile(),
            tokens: tokens.into(),
        }),
        Err(error) => handle_domain_error(error),
    }
}
