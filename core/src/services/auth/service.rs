//! Main authentication service implementation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use kw_shared::validation::{normalize_email, validators, MAX_EMAIL_LENGTH};

use crate::domain::entities::token::{AccessToken, TokenPair};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError, DomainResult, ValidationError};
use crate::repositories::{TokenRepository, UserRepository};
use crate::services::token::TokenService;

use super::config::{AuthServiceConfig, MAX_USERNAME_LENGTH};

/// Input of a registration
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Authentication service composing user storage, password hashing and
/// the token service
pub struct AuthService<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    /// User repository for database operations
    user_repository: Arc<U>,
    /// Token service for JWT management
    token_service: Arc<TokenService<T, U>>,
    /// Service configuration
    config: AuthServiceConfig,
}

impl<U, T> AuthService<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Repository for user data persistence
    /// * `token_service` - Service for JWT token management
    /// * `config` - Service configuration
    pub fn new(
        user_repository: Arc<U>,
        token_service: Arc<TokenService<T, U>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            token_service,
            config,
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService<T, U>> {
        &self.token_service
    }

    /// Register a new user and issue their first token pair
    ///
    /// # Returns
    ///
    /// * `Ok((User, TokenPair))` - The stored user and its tokens
    /// * `Err(DomainError::ValidationErr)` - Malformed email, username or password
    /// * `Err(DomainError::Auth(UserAlreadyExists))` - Email already taken
    pub async fn register(
        &self,
        command: RegisterCommand,
        now: DateTime<Utc>,
    ) -> DomainResult<(User, TokenPair)> {
        let email = self.validate_email(&command.email)?;
        let username = command.username.trim().to_string();
        self.validate_username(&username)?;
        self.validate_password(&command.password)?;

        if self.user_repository.exists_by_email(&email).await? {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = hash_password(command.password, self.config.bcrypt_cost).await?;
        let user = self
            .user_repository
            .create(User::new(email, username, password_hash, now))
            .await?;

        info!("Registered user {}", user.id);

        let tokens = self.token_service.issue_token_pair(&user, now).await?;
        Ok((user, tokens))
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<(User, TokenPair)> {
        let email = normalize_email(email);

        let user = match self.user_repository.find_by_email(&email).await? {
            Some(user) => user,
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.token_service.issue_token_pair(&user, now).await?;
        info!("User {} logged in", user.id);
        Ok((user, tokens))
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> DomainResult<AccessToken> {
        self.token_service.refresh_access_token(refresh_token, now).await
    }

    /// Revoke the presented access token and, if given, the refresh token
    ///
    /// A refresh token that does not verify is logged and skipped. Storage
    /// and key failures are returned, since the refresh token may still be
    /// live.
    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.token_service.revoke(access_token, now).await?;

        if let Some(refresh_token) = refresh_token {
            match self.token_service.revoke(refresh_token, now).await {
                Ok(_) => {}
                Err(DomainError::Token(e)) => {
                    warn!("Ignoring unusable refresh token on logout: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// The user behind an access token
    pub async fn me(&self, access_token: &str, now: DateTime<Utc>) -> DomainResult<User> {
        self.token_service.identify_user(access_token, now).await
    }

    fn validate_email(&self, email: &str) -> DomainResult<String> {
        if !validators::not_empty(email) {
            return Err(ValidationError::RequiredField {
                field: "email".to_string(),
            }
            .into());
        }
        let email = normalize_email(email);
        if email.len() > MAX_EMAIL_LENGTH || !validators::is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail.into());
        }
        Ok(email)
    }

    fn validate_username(&self, username: &str) -> DomainResult<()> {
        if !validators::not_empty(username) {
            return Err(ValidationError::RequiredField {
                field: "username".to_string(),
            }
            .into());
        }
        if !validators::length_between(username, 1, MAX_USERNAME_LENGTH) {
            return Err(ValidationError::InvalidLength {
                field: "username".to_string(),
                min: 1,
                max: MAX_USERNAME_LENGTH,
            }
            .into());
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> DomainResult<()> {
        let (min, max) = (self.config.min_password_length, self.config.max_password_length);
        if !validators::length_between(password, min, max) {
            return Err(ValidationError::InvalidLength {
                field: "password".to_string(),
                min,
                max,
            }
            .into());
        }
        Ok(())
    }
}

/// bcrypt on the blocking pool
async fn hash_password(password: String, cost: u32) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| DomainError::internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            DomainError::internal("password hashing failed")
        })
}

async fn verify_password(password: String, hash: String) -> DomainResult<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::internal(format!("password check task failed: {}", e)))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!("Stored password hash could not be checked: {}", e);
            Ok(false)
        }
    }
}
