//! Common validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Deliberately loose address shape: one `@`, no whitespace, a dotted domain.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

/// Maximum accepted email length (RFC 5321 path limit)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum accepted password length; bcrypt ignores bytes past 72 anyway.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Lowercase and trim an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Common validation functions
pub mod validators {
    use super::{EMAIL_REGEX, MAX_EMAIL_LENGTH};

    /// Check if a string is not empty
    pub fn not_empty(value: &str) -> bool {
        !value.trim().is_empty()
    }

    /// Check if a string length (in characters) is within bounds
    pub fn length_between(value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        len >= min && len <= max
    }

    /// Check if an email address is well formed
    pub fn is_valid_email(email: &str) -> bool {
        email.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(email)
    }
}
