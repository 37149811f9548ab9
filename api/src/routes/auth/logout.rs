use actix_web::{web, HttpResponse};
use chrono::Utc;

use kw_core::repositories::{TokenRepository, UserRepository};

use crate::dto::auth::{LogoutRequest, MessageResponse};
use crate::handlers::handle_domain_error;
use crate::middleware::auth::AuthContext;
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Blacklists the bearer access token and, when the body carries one, the
/// refresh token. Requires `Authorization: Bearer {access_token}`.
///
/// ## Success (200 OK)
/// ```json
/// { "message": "Logged out successfully" }
/// ```
pub async fn logout<U, T>(
    state: web::Data<AppState<U, T>>,
    auth: AuthContext,
    body: Option<web::Json<LogoutRequest>>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let refresh = body.and_then(|b| b.into_inner().refresh);

    match state
        .auth_service
        .logout(&auth.access_token, refresh.as_deref(), Utc::now())
        .await
    {
        Ok(()) => {
            log::info!("User {} logged out", auth.user_id);
            HttpResponse::Ok().json(MessageResponse {
                message: "Logged out successfully".to_string(),
            })
        }
        Err(error) => handle_domain_error(error),
    }
}
