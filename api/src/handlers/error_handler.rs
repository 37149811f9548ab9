//! Mapping of domain errors to HTTP responses
//!
//! Token and credential failures are 401 with a short reason; key material
//! failures are 503 so the service fails closed; repository failures are 500
//! with a generic message. Internal detail is logged, never returned.

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse};
use validator::ValidationErrors;

use kw_core::errors::{AuthError, DomainError, KeyError, TokenError};
use kw_shared::{error_codes, ErrorResponse};

use crate::dto::ErrorResponseExt;

/// Convert a domain error into the HTTP response sent to the client
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    let (status, response) = match &error {
        DomainError::Token(e) => token_error(e),
        DomainError::Auth(e) => auth_error(e),
        DomainError::Key(e) => key_error(e),
        DomainError::ValidationErr(e) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, e.to_string()),
        ),
        DomainError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone()),
        ),
        DomainError::NotFound { resource } => {
            log::debug!("Resource not found: {}", resource);
            (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(error_codes::NOT_FOUND, "Resource not found"),
            )
        }
        DomainError::Internal { message } => {
            log::error!("Internal error: {}", message);
            internal_error()
        }
    };

    response.to_response(status)
}

fn token_error(error: &TokenError) -> (StatusCode, ErrorResponse) {
    let code = match error {
        TokenError::TokenGenerationFailed => {
            log::error!("Token generation failed");
            return internal_error();
        }
        TokenError::TokenExpired | TokenError::RefreshTokenExpired => error_codes::TOKEN_EXPIRED,
        TokenError::TokenBlacklisted | TokenError::TokenRevoked => error_codes::TOKEN_REVOKED,
        TokenError::InvalidTokenFormat
        | TokenError::InvalidSignature
        | TokenError::InvalidClaims
        | TokenError::WrongTokenKind
        | TokenError::RefreshTokenNotFound => error_codes::TOKEN_INVALID,
    };
    (
        StatusCode::UNAUTHORIZED,
        ErrorResponse::new(code, error.to_string()),
    )
}

fn auth_error(error: &AuthError) -> (StatusCode, ErrorResponse) {
    match error {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::INVALID_CREDENTIALS, error.to_string()),
        ),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            ErrorResponse::new(error_codes::CONFLICT, error.to_string()),
        ),
        AuthError::UserNotFound | AuthError::AuthenticationRequired => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::UNAUTHORIZED, error.to_string()),
        ),
    }
}

fn key_error(error: &KeyError) -> (StatusCode, ErrorResponse) {
    log::error!("Key material failure: {}", error);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorResponse::new(
            error_codes::KEYS_UNAVAILABLE,
            "Authentication is temporarily unavailable",
        ),
    )
}

fn internal_error() -> (StatusCode, ErrorResponse) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
    )
}

/// 400 response listing the fields that failed DTO validation
pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    let mut response = ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data");
    for (field, field_errors) in errors.field_errors() {
        let codes: Vec<String> = field_errors.iter().map(|e| e.code.to_string()).collect();
        response = response.add_detail(field.to_string(), codes);
    }
    response.to_response(StatusCode::BAD_REQUEST)
}

/// JSON extractor error handler returning the standard 400 body
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected request body: {}", err);
    let response = ErrorResponse::new(error_codes::BAD_REQUEST, "Malformed JSON body")
        .to_response(StatusCode::BAD_REQUEST);
    actix_web::error::InternalError::from_response(err, response).into()
}
