//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use kw_core::domain::entities::user::User;
use kw_core::errors::{AuthError, DomainError};
use kw_core::repositories::UserRepository;

use super::{is_duplicate_key, query_error};

const SELECT_USER: &str = r#"
    SELECT id, email, username, password_hash, is_email_verified,
           created_at, updated_at
    FROM users
"#;

/// MySQL implementation of UserRepository
///
/// The `email` column carries a unique index; a concurrent duplicate
/// registration surfaces as `UserAlreadyExists`.
pub struct MySqlUserRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserRepository {
    /// Create a new MySQL user repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let column = |e: sqlx::Error| DomainError::internal(format!("Failed to read user row: {}", e));

        let id: String = row.try_get("id").map_err(column)?;

        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| DomainError::internal(format!("Invalid UUID: {}", e)))?,
            email: row.try_get("email").map_err(column)?,
            username: row.try_get("username").map_err(column)?,
            password_hash: row.try_get("password_hash").map_err(column)?,
            is_email_verified: row.try_get("is_email_verified").map_err(column)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(column)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(column)?,
        })
    }

    async fn find_one(&self, filter: &str, value: String) -> Result<Option<User>, DomainError> {
        let query = format!("{} WHERE {} = ? LIMIT 1", SELECT_USER, filter);

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("Failed to find user"))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.find_one("id", id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.find_one("email", email.to_string()).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (
                id, email, username, password_hash, is_email_verified,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_email_verified)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::debug!("Created user {}", user.id);
                Ok(user)
            }
            Err(e) if is_duplicate_key(&e) => Err(AuthError::UserAlreadyExists.into()),
            Err(e) => Err(query_error("Failed to create user")(e)),
        }
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            UPDATE users
            SET email = ?, username = ?, password_hash = ?, is_email_verified = ?,
                updated_at = ?
            WHERE id = ?
        "#;

        let result = sqlx::query(query)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_email_verified)
            .bind(user.updated_at)
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                // MySQL reports zero affected rows for unchanged values too.
                if self.find_by_id(user.id).await?.is_none() {
                    return Err(DomainError::NotFound {
                        resource: format!("User with id {}", user.id),
                    });
                }
                Ok(user)
            }
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(AuthError::UserAlreadyExists.into()),
            Err(e) => Err(query_error("Failed to update user")(e)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to delete user"))?;

        Ok(result.rows_affected() > 0)
    }
}
