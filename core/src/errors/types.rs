//! Domain-specific error types for key management, tokens and authentication
//!
//! The HTTP layer owns the mapping from these variants to status codes and
//! client-facing messages.

use thiserror::Error;

/// Key material errors
///
/// `Corrupted` and `Expired` are recovered inside the rotation engine by
/// regenerating; the remaining variants reach callers.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Key material not found: {path}")]
    NotFound { path: String },

    #[error("Key material corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("Key material expired")]
    Expired,

    #[error("Key storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key generation failed: {reason}")]
    Generation { reason: String },

    #[error("Key material unavailable")]
    Unavailable,
}

impl KeyError {
    /// Whether regenerating the key set fixes this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeyError::NotFound { .. } | KeyError::Corrupted { .. } | KeyError::Expired
        )
    }
}

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email and wrong password both end up here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Authentication required")]
    AuthenticationRequired,
}

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid claims")]
    InvalidClaims,

    #[error("Wrong token type")]
    WrongTokenKind,

    #[error("Token blacklisted")]
    TokenBlacklisted,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid length: {field} (min: {min}, max: {max})")]
    InvalidLength {
        field: String,
        min: usize,
        max: usize,
    },

    #[error("Invalid email")]
    InvalidEmail,
}
