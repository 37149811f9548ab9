use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use kw_core::repositories::{TokenRepository, UserRepository};

use crate::routes::AppState;

#[derive(Debug, Serialize)]
pub struct KeysHealth {
    pub status: &'static str,
    pub expires_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub keys: KeysHealth,
}

/// Handler for GET /health
///
/// Reports the cached key set without touching the key store. Answers 503
/// when tokens can be neither issued nor verified.
pub async fn health<U, T>(state: web::Data<AppState<U, T>>) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let health = state.keys.cached_status(Utc::now());
    let body = HealthResponse {
        status: if health.is_usable() { "ok" } else { "degraded" },
        keys: KeysHealth {
            status: health.label(),
            expires_at: health.expires_at(),
        },
    };

    if health.is_usable() {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
