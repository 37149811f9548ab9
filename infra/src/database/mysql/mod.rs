//! MySQL repository implementations

mod token_repository_impl;
mod user_repository_impl;

pub use token_repository_impl::MySqlTokenRepository;
pub use user_repository_impl::MySqlUserRepository;

use kw_core::errors::DomainError;

/// Wrap a sqlx failure as an internal domain error with context
pub(crate) fn query_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        tracing::error!("{}: {}", context, e);
        DomainError::internal(format!("{}: {}", context, e))
    }
}

/// Whether a sqlx failure is a unique key violation
pub(crate) fn is_duplicate_key(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
