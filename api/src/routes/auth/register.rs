use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use kw_core::repositories::{TokenRepository, UserRepository};
use kw_core::services::auth::RegisterCommand;

use crate::dto::auth::{AuthResponse, RegisterRequest};
use crate::handlers::{handle_domain_error, validation_error_response};
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/register
///
/// # Request Body
///
/// ```json
/// {
///     "email": "alice@example.com",
///     "username": "alice",
///     "password": "correct-horse"
/// }
/// ```
///
/// # Response
///
/// ## Success (201 Created)
/// ```json
/// {
///     "user": { "id": "...", "email": "alice@example.com", "username": "alice", ... },
///     "tokens": { "access": "eyJ...", "refresh": "eyJ...", "access_expires_in": 900, ... }
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Malformed email, username or password
/// - 409 Conflict: Email already registered
/// - 503 Service Unavailable: No usable key material
pub async fn register<U, T>(
    state: web::Data<AppState<U, T>>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        log::debug!("Registration rejected by validation: {}", errors);
        return validation_error_response(&errors);
    }

    let request = request.into_inner();
    let command = RegisterCommand {
        email: request.email,
        username: request.username,
        password: request.password,
    };

    match state.auth_service.register(command, Utc::now()).await {
        Ok((user, tokens)) => HttpResponse::Created().json(AuthResponse {
            user: user.profile(),
            tokens: tokens.into(),
        }),
        Err(error) => handle_domain_error(error),
    }
}
