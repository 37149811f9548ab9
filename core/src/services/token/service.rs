//! Main token service implementation

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::key_material::DerivedSecret;
use crate::domain::entities::token::{
    hash_token, AccessToken, BlacklistEntry, Claims, RefreshToken, RevokeOutcome, TokenKind,
    TokenPair,
};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError, KeyError, TokenError};
use crate::repositories::{TokenRepository, UserRepository};
use crate::services::keys::KeyRotationEngine;

use super::config::TokenServiceConfig;

/// Service for issuing, verifying and revoking JWTs
///
/// Tokens are signed HS256 with the secret derived from the current key
/// set, so rotating the keys invalidates every outstanding token.
pub struct TokenService<R: TokenRepository, U: UserRepository> {
    pub(crate) token_repository: Arc<R>,
    user_repository: Arc<U>,
    keys: Arc<KeyRotationEngine>,
    config: TokenServiceConfig,
    validation: Validation,
}

impl<R: TokenRepository, U: UserRepository> TokenService<R, U> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `token_repository` - Refresh token ledger and blacklist
    /// * `user_repository` - Used to resolve token subjects
    /// * `keys` - Owner of the signing secret
    /// * `config` - Token service configuration
    pub fn new(
        token_repository: Arc<R>,
        user_repository: Arc<U>,
        keys: Arc<KeyRotationEngine>,
        config: TokenServiceConfig,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        // Expiry is checked against the caller's clock
        validation.validate_exp = false;

        Self {
            token_repository,
            user_repository,
            keys,
            config,
            validation,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn keys(&self) -> &Arc<KeyRotationEngine> {
        &self.keys
    }

    /// Issues an access and a refresh token for `user`
    ///
    /// The refresh token's ledger row is stored before either token is
    /// returned.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The generated token pair
    /// * `Err(DomainError::Key)` - No usable key material
    /// * `Err(DomainError::Token)` - Signing or ledger write failed
    pub async fn issue_token_pair(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair, DomainError> {
        let secret = self.signing_secret(now).await?;

        let access_claims = self.claims_for(user, TokenKind::Access, now);
        let refresh_claims = self.claims_for(user, TokenKind::Refresh, now);

        let access_token = self.encode_jwt(&access_claims, &secret)?;
        let refresh_token = self.encode_jwt(&refresh_claims, &secret)?;

        let expires_at = refresh_claims
            .expires_at()
            .ok_or(DomainError::Token(TokenError::TokenGenerationFailed))?;
        let ledger_row = RefreshToken::new(user.id, hash_token(&refresh_token), now, expires_at);

        self.token_repository
            .save_refresh_token(ledger_row)
            .await
            .map_err(|e| {
                error!("Failed to store refresh token for user {}: {}", user.id, e);
                DomainError::Token(TokenError::TokenGenerationFailed)
            })?;

        debug!("Issued token pair for user {}", user.id);

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_expiry_secs,
            self.config.refresh_token_expiry_secs,
        ))
    }

    /// Verifies a token of the expected kind and returns its claims
    ///
    /// Checks run in order: blacklist, signature, expiry, kind.
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - The decoded claims if valid
    /// * `Err(DomainError::Token)` - `TokenBlacklisted`, `InvalidSignature`,
    ///   `InvalidTokenFormat`, `InvalidClaims`, `TokenExpired` or `WrongTokenKind`
    /// * `Err(DomainError::Key)` - No key material to verify with
    pub async fn verify(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, DomainError> {
        if self
            .token_repository
            .is_token_blacklisted(&hash_token(token))
            .await?
        {
            return Err(TokenError::TokenBlacklisted.into());
        }

        let claims = self.decode_jwt(token, now).await?;

        if claims.is_expired_at(now) {
            return Err(TokenError::TokenExpired.into());
        }

        if claims.token_type != expected {
            return Err(TokenError::WrongTokenKind.into());
        }

        Ok(claims)
    }

    /// Mints a new access token from a refresh token
    ///
    /// The refresh token itself is not rotated.
    ///
    /// # Returns
    ///
    /// * `Ok(AccessToken)` - The new access token
    /// * `Err(TokenError::TokenRevoked)` - Revoked or blacklisted
    /// * `Err(TokenError::RefreshTokenNotFound)` - No ledger row
    /// * `Err(TokenError::RefreshTokenExpired)` - Ledger row expired
    /// * `Err(AuthError::UserNotFound)` - Subject no longer exists
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, DomainError> {
        let claims = match self.verify(refresh_token, TokenKind::Refresh, now).await {
            Err(DomainError::Token(TokenError::TokenBlacklisted)) => {
                return Err(TokenError::TokenRevoked.into())
            }
            other => other?,
        };

        let ledger_row = self
            .token_repository
            .find_refresh_token(&hash_token(refresh_token))
            .await?
            .ok_or(DomainError::Token(TokenError::RefreshTokenNotFound))?;

        if ledger_row.is_revoked {
            return Err(TokenError::TokenRevoked.into());
        }
        if ledger_row.is_expired_at(now) {
            return Err(TokenError::RefreshTokenExpired.into());
        }

        let user = self.subject_of(&claims).await?;
        let secret = self.signing_secret(now).await?;
        let access_claims = self.claims_for(&user, TokenKind::Access, now);
        let token = self.encode_jwt(&access_claims, &secret)?;

        Ok(AccessToken {
            token,
            expires_at: now + Duration::seconds(self.config.access_token_expiry_secs),
            expires_in: self.config.access_token_expiry_secs,
        })
    }

    /// Blacklists a token so it never verifies again
    ///
    /// The signature must verify; expiry is ignored. For refresh tokens the
    /// ledger flag and the blacklist entry are written together.
    pub async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<RevokeOutcome, DomainError> {
        let token_hash = hash_token(token);

        if self.token_repository.is_token_blacklisted(&token_hash).await? {
            return Ok(RevokeOutcome::AlreadyRevoked);
        }

        let claims = self.decode_jwt(token, now).await?;
        let expires_at = claims.expires_at().unwrap_or(now);
        let entry = BlacklistEntry::new(token_hash.clone(), now, expires_at);

        let newly_blacklisted = match claims.token_type {
            TokenKind::Refresh => {
                self.token_repository
                    .revoke_and_blacklist(&token_hash, entry)
                    .await?
            }
            TokenKind::Access => self.token_repository.blacklist_token(entry).await?,
        };

        if newly_blacklisted {
            info!("Revoked {} token for subject {}", claims.token_type, claims.sub);
            Ok(RevokeOutcome::Revoked(claims.token_type))
        } else {
            Ok(RevokeOutcome::AlreadyRevoked)
        }
    }

    /// Resolves the user behind a valid access token
    pub async fn identify_user(&self, access_token: &str, now: DateTime<Utc>) -> Result<User, DomainError> {
        let claims = self.verify(access_token, TokenKind::Access, now).await?;
        self.subject_of(&claims).await
    }

    /// Revokes every ledger row of a user
    pub async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let count = self.token_repository.revoke_all_user_tokens(user_id).await?;
        info!("Revoked {} refresh tokens for user {}", count, user_id);
        Ok(count)
    }

    /// Deletes expired ledger rows and blacklist entries
    ///
    /// # Returns
    ///
    /// `(ledger_rows_deleted, blacklist_entries_deleted)`
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<(usize, usize), DomainError> {
        let ledger = self.token_repository.delete_expired_tokens(now).await?;
        let blacklist = self.token_repository.cleanup_blacklist(now).await?;
        Ok((ledger, blacklist))
    }

    fn claims_for(&self, user: &User, kind: TokenKind, now: DateTime<Utc>) -> Claims {
        let lifetime = match kind {
            TokenKind::Access => self.config.access_token_expiry_secs,
            TokenKind::Refresh => self.config.refresh_token_expiry_secs,
        };
        Claims::new(user.id, &user.email, kind, now, Duration::seconds(lifetime))
            .with_audience(&self.config.issuer, &self.config.audience)
    }

    /// Secret for signing; validates the stored key set first
    async fn signing_secret(&self, now: DateTime<Utc>) -> Result<DerivedSecret, DomainError> {
        self.with_keys(move |keys| {
            let material = keys.ensure_valid_keys(now)?;
            Ok(KeyRotationEngine::derive_secret(&material))
        })
        .await
    }

    /// Runs a key engine call on the blocking pool
    ///
    /// The engine takes a std mutex and the store's file lock, and may read
    /// the key files or generate an RSA key.
    async fn with_keys<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&KeyRotationEngine) -> Result<T, KeyError> + Send + 'static,
        T: Send + 'static,
    {
        let keys = Arc::clone(&self.keys);
        let outcome = tokio::task::spawn_blocking(move || f(keys.as_ref()))
            .await
            .map_err(|e| {
                error!("Key engine task failed: {}", e);
                DomainError::internal("Key engine task failed")
            })?;
        Ok(outcome?)
    }

    /// Encodes claims into a JWT
    pub(crate) fn encode_jwt(&self, claims: &Claims, secret: &DerivedSecret) -> Result<String, DomainError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|_| DomainError::Token(TokenError::TokenGenerationFailed))
    }

    /// Checks the signature and issuer/audience, but not expiry
    async fn decode_jwt(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DomainError> {
        let secret = self.with_keys(move |keys| keys.current_secret(now)).await?;
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation,
        )
        .map_err(|e| {
            let mapped = match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::InvalidClaims,
                _ => TokenError::InvalidTokenFormat,
            };
            debug!("Token rejected: {}", mapped);
            DomainError::Token(mapped)
        })?;

        Ok(token_data.claims)
    }

    async fn subject_of(&self, claims: &Claims) -> Result<User, DomainError> {
        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::InvalidClaims))?;

        match self.user_repository.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Token subject {} no longer exists", user_id);
                Err(AuthError::UserNotFound.into())
            }
        }
    }
}
