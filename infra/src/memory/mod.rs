//! In-memory repository implementations
//!
//! Process-local storage selected with `STORAGE_BACKEND=memory`. Everything
//! is lost on restart; intended for development and integration tests.

mod token_repository;
mod user_repository;


pub use token_repository::InMemoryTokenRepository;
pub use user_repository::InMemoryUserRepository;
