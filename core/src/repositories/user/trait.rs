//! User repository trait defining the interface for user data persistence.
//!
//! The trait is async-first and uses Result types for error handling; the
//! domain layer never sees the storage engine behind it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// Emails are stored lowercased and are unique across users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user found with given ID
    /// * `Err(DomainError)` - Storage error occurred
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Find a user by lowercased email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    ///
    /// # Returns
    /// * `Ok(User)` - Created user
    /// * `Err(DomainError)` - Creation failed (e.g., duplicate email)
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::Utc;
    /// # use kw_core::repositories::UserRepository;
    /// # use kw_core::domain::entities::user::User;
    /// # async fn example(repo: &impl UserRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let user = User::new("alice@example.com", "alice", "$2b$12$...", Utc::now());
    /// let created = repo.create(user).await?;
    /// println!("Created user: {}", created.id);
    /// # Ok(())
    /// # }
    /// ```
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Whether a user with this lowercased email exists
    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email).await?.is_some())
    }
}
