//! Application factory
//!
//! Builds the actix-web `App` from shared state so the server binary and the
//! integration tests run the same routing and middleware stack.

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpResponse};

use kw_core::repositories::{TokenRepository, UserRepository};
use kw_shared::config::{CorsConfig, Environment};

use crate::handlers::json_error_handler;
use crate::middleware::{
    auth::{AccessTokenVerifier, JwtAuth},
    cors::create_cors,
    security::SecurityMiddleware,
};
use crate::routes::{auth, health::health, AppState};

/// Create and configure the application with all dependencies
pub fn create_app<U, T>(
    app_state: web::Data<AppState<U, T>>,
    cors: &CorsConfig,
    environment: Environment,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let verifier: Arc<dyn AccessTokenVerifier> = app_state.auth_service.token_service().clone();

    App::new()
        .app_data(app_state)
        .app_data(web::Data::new(verifier))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        // Middleware order: the last wrap runs first
        .wrap(Logger::default())
        .wrap(create_cors(cors, environment))
        .wrap(SecurityMiddleware::for_environment(environment))
        .route("/health", web::get().to(health::<U, T>))
        .service(
            web::scope("/api/v1").service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register::<U, T>))
                    .route("/login", web::post().to(auth::login::<U, T>))
                    .route("/refresh", web::post().to(auth::refresh::<U, T>))
                    .route(
                        "/logout",
                        web::post().to(auth::logout::<U, T>).wrap(JwtAuth::new()),
                    )
                    .route("/me", web::get().to(auth::me::<U, T>).wrap(JwtAuth::new())),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "NOT_FOUND",
        "message": "The requested resource was not found"
    }))
}
