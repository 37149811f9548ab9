//! # Infrastructure Layer
//!
//! Concrete storage behind the repository traits of `kw_core`.
//!
//! ## Architecture
//!
//! - **Database**: MySQL implementations using SQLx, plus the connection pool
//! - **Memory**: process-local implementations for development and tests
//!
//! Both backends implement `TokenRepository` and `UserRepository`, so the
//! API layer picks one at startup and the services never know which.

pub mod database;
pub mod memory;

pub use database::{DatabasePool, MySqlTokenRepository, MySqlUserRepository, PoolStatistics};
pub use memory::{InMemoryTokenRepository, InMemoryUserRepository};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

/// Result type for infrastructure operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<InfrastructureError> for kw_core::errors::DomainError {
    fn from(err: InfrastructureError) -> Self {
        kw_core::errors::DomainError::internal(err.to_string())
    }
}
