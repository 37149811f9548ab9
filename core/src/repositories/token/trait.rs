//! Token repository trait defining the interface for the refresh token ledger
//! and the blacklist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{BlacklistEntry, RefreshToken};
use crate::errors::DomainError;

/// Repository trait for refresh token and blacklist persistence
///
/// Every token is addressed by the SHA-256 hash of its signed value; raw
/// tokens never reach storage.
///
/// # Security Considerations
/// - A revoked ledger row is never reset to unrevoked
/// - Blacklisting is idempotent and must be durable before it returns
/// - Expired rows and entries may be removed at any time
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Save a new refresh token to the ledger
    ///
    /// # Arguments
    /// * `token` - The RefreshToken entity to persist
    ///
    /// # Returns
    /// * `Ok(RefreshToken)` - The saved token
    /// * `Err(DomainError)` - Save failed (e.g., duplicate token hash)
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use uuid::Uuid;
    /// # use kw_core::repositories::TokenRepository;
    /// # use kw_core::domain::entities::token::RefreshToken;
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let now = Utc::now();
    /// let token = RefreshToken::new(Uuid::new_v4(), "hashed".to_string(), now, now + Duration::days(366));
    ///
    /// let saved = repo.save_refresh_token(token).await?;
    /// println!("Token saved with ID: {}", saved.id);
    /// # Ok(())
    /// # }
    /// ```
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError>;

    /// Find a refresh token by its hashed value
    ///
    /// # Returns
    /// * `Ok(Some(RefreshToken))` - Token found, revoked or not
    /// * `Ok(None)` - No token found with given hash
    /// * `Err(DomainError)` - Storage error occurred
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;

    /// Find all usable refresh tokens for a user at `now`
    async fn find_by_user_id(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, DomainError>;

    /// Revoke a specific refresh token
    ///
    /// # Returns
    /// * `Ok(true)` - Token was found and is now revoked
    /// * `Ok(false)` - Token not found
    async fn revoke_token(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Revoke all refresh tokens for a user, returning how many changed
    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError>;

    /// Delete ledger rows that expired before `now`
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Add a token hash to the blacklist
    ///
    /// # Returns
    /// * `Ok(true)` - The entry was added
    /// * `Ok(false)` - The hash was already blacklisted; nothing changed
    async fn blacklist_token(&self, entry: BlacklistEntry) -> Result<bool, DomainError>;

    /// Whether a token hash is blacklisted
    async fn is_token_blacklisted(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Revoke the ledger row and blacklist the hash as one atomic step
    ///
    /// Either both changes are visible afterwards or neither is.
    ///
    /// # Returns
    /// * `Ok(true)` - The hash was newly blacklisted
    /// * `Ok(false)` - The hash was already blacklisted
    async fn revoke_and_blacklist(
        &self,
        token_hash: &str,
        entry: BlacklistEntry,
    ) -> Result<bool, DomainError>;

    /// Remove blacklist entries whose token expired before `now`
    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Check if a token exists and is usable at `now`
    async fn is_token_valid(&self, token_hash: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        match self.find_refresh_token(token_hash).await? {
            Some(token) => Ok(token.is_valid_at(now)),
            None => Ok(false),
        }
    }

    /// Count active tokens for a user
    async fn count_user_tokens(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let tokens = self.find_by_user_id(user_id, now).await?;
        Ok(tokens.len())
    }
}
