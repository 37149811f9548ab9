use actix_web::{web, HttpResponse};
use chrono::Utc;

use kw_core::repositories::{TokenRepository, UserRepository};

use crate::handlers::handle_domain_error;
use crate::middleware::auth::AuthContext;
use crate::routes::AppState;

/// Handler for GET /api/v1/auth/me
///
/// Returns the public profile of the bearer token's user.
pub async fn me<U, T>(state: web::Data<AppState<U, T>>, auth: AuthContext) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    match state.auth_service.me(&auth.access_token, Utc::now()).await {
        Ok(user) => HttpResponse::Ok().json(user.profile()),
        Err(error) => handle_domain_error(error),
    }
}
