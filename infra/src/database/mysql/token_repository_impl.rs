//! MySQL implementation of the TokenRepository trait.
//!
//! Refresh tokens live in `refresh_tokens`, revoked access and refresh token
//! hashes in `blacklisted_tokens`. Only SHA-256 hashes are stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use kw_core::domain::entities::token::{BlacklistEntry, RefreshToken};
use kw_core::errors::DomainError;
use kw_core::repositories::TokenRepository;

use super::{is_duplicate_key, query_error};

const SELECT_TOKEN: &str = r#"
    SELECT id, user_id, token_hash, created_at, expires_at, is_revoked
    FROM refresh_tokens
"#;

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<RefreshToken, DomainError> {
        let column = |e: sqlx::Error| DomainError::internal(format!("Failed to read token row: {}", e));

        let id: String = row.try_get("id").map_err(column)?;
        let user_id: String = row.try_get("user_id").map_err(column)?;

        Ok(RefreshToken {
            id: Uuid::parse_str(&id)
                .map_err(|e| DomainError::internal(format!("Invalid token UUID: {}", e)))?,
            user_id: Uuid::parse_str(&user_id)
                .map_err(|e| DomainError::internal(format!("Invalid user UUID: {}", e)))?,
            token_hash: row.try_get("token_hash").map_err(column)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(column)?,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(column)?,
            is_revoked: row.try_get("is_revoked").map_err(column)?,
        })
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, user_id, token_hash, created_at, expires_at, is_revoked
            ) VALUES (?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(token.id.to_string())
            .bind(token.user_id.to_string())
            .bind(&token.token_hash)
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.is_revoked)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(token),
            Err(e) if is_duplicate_key(&e) => Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            }),
            Err(e) => Err(query_error("Failed to save refresh token")(e)),
        }
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("{} WHERE token_hash = ? LIMIT 1", SELECT_TOKEN);

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("Failed to find refresh token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_user_id(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, DomainError> {
        let query = format!(
            "{} WHERE user_id = ? AND is_revoked = FALSE AND expires_at >= ? ORDER BY created_at DESC",
            SELECT_TOKEN
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("Failed to find user tokens"))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        // A matched row that is already revoked still counts as found.
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE
            WHERE token_hash = ?
        "#;

        let result = sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to revoke token"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        Ok(self.find_refresh_token(token_hash).await?.is_some())
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE
            WHERE user_id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to revoke user tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to delete expired tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn blacklist_token(&self, entry: BlacklistEntry) -> Result<bool, DomainError> {
        let query = r#"
            INSERT IGNORE INTO blacklisted_tokens (token_hash, blacklisted_at, expires_at)
            VALUES (?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(&entry.token_hash)
            .bind(entry.blacklisted_at)
            .bind(entry.expires_at)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to blacklist token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_token_blacklisted(&self, token_hash: &str) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 FROM blacklisted_tokens WHERE token_hash = ? LIMIT 1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("Failed to check blacklist"))?;

        Ok(row.is_some())
    }

    async fn revoke_and_blacklist(
        &self,
        token_hash: &str,
        entry: BlacklistEntry,
    ) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_error("Failed to begin revocation"))?;

        sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&mut *tx)
            .await
            .map_err(query_error("Failed to revoke token"))?;

        let inserted = sqlx::query(
            "INSERT IGNORE INTO blacklisted_tokens (token_hash, blacklisted_at, expires_at) VALUES (?, ?, ?)",
        )
        .bind(&entry.token_hash)
        .bind(entry.blacklisted_at)
        .bind(entry.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error("Failed to blacklist token"))?;

        tx.commit()
            .await
            .map_err(query_error("Failed to commit revocation"))?;

        Ok(inserted.rows_affected() > 0)
    }

    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to clean up blacklist"))?;

        Ok(result.rows_affected() as usize)
    }
}
