//! Shared utilities and common types for the Keyward server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error response structures
//! - Validation helpers

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment, JwtConfig, KeyConfig,
    LoggingConfig, ServerConfig, StorageBackend,
};
pub use errors::{error_codes, ErrorResponse};
pub use utils::validation;
