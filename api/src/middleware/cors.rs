//! CORS middleware configuration for cross-origin requests.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use kw_shared::config::{CorsConfig, Environment};

/// Creates a CORS middleware instance for the given environment.
///
/// Development allows any origin. Elsewhere only the origins listed in
/// `ALLOWED_ORIGINS` (see [`CorsConfig::from_env`]) are accepted.
pub fn create_cors(config: &CorsConfig, environment: Environment) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(config.max_age);

    let cors = if environment.is_development() {
        log::info!("Configuring permissive CORS for development");
        cors.allow_any_origin()
    } else {
        config
            .allowed_origins
            .iter()
            .filter(|origin| !origin.is_empty())
            .fold(cors, |cors, origin| {
                log::info!("Adding allowed origin: {}", origin);
                cors.allowed_origin(origin)
            })
    };

    if config.allow_credentials {
        cors.supports_credentials()
    } else {
        cors
    }
}
