use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use kw_core::domain::entities::token::{BlacklistEntry, RefreshToken};
use kw_core::errors::DomainError;
use kw_core::repositories::TokenRepository;

#[derive(Default)]
struct Ledger {
    /// Refresh tokens keyed by token hash
    tokens: HashMap<String, RefreshToken>,
    /// Blacklist keyed by token hash
    blacklist: HashMap<String, BlacklistEntry>,
}

/// Refresh token ledger and blacklist held behind one lock
///
/// Holding both maps under the same `RwLock` makes `revoke_and_blacklist`
/// atomic with respect to every reader.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    ledger: RwLock<Ledger>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger rows, revoked or not
    pub async fn len(&self) -> usize {
        self.ledger.read().await.tokens.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let mut ledger = self.ledger.write().await;

        if ledger.tokens.contains_key(&token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }

        ledger.tokens.insert(token.token_hash.clone(), token.clone());
        tracing::debug!("Stored refresh token {} for user {}", token.id, token.user_id);
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        Ok(self.ledger.read().await.tokens.get(token_hash).cloned())
    }

    async fn find_by_user_id(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, DomainError> {
        let ledger = self.ledger.read().await;
        let mut tokens: Vec<RefreshToken> = ledger
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_valid_at(now))
            .cloned()
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut ledger = self.ledger.write().await;
        Ok(match ledger.tokens.get_mut(token_hash) {
            Some(token) => {
                token.revoke();
                true
            }
            None => false,
        })
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut ledger = self.ledger.write().await;
        let mut revoked = 0;
        for token in ledger
            .tokens
            .values_mut()
            .filter(|t| t.user_id == user_id && !t.is_revoked)
        {
            token.revoke();
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut ledger = self.ledger.write().await;
        let before = ledger.tokens.len();
        ledger.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok(before - ledger.tokens.len())
    }

    async fn blacklist_token(&self, entry: BlacklistEntry) -> Result<bool, DomainError> {
        let mut ledger = self.ledger.write().await;
        if ledger.blacklist.contains_key(&entry.token_hash) {
            return Ok(false);
        }
        ledger.blacklist.insert(entry.token_hash.clone(), entry);
        Ok(true)
    }

    async fn is_token_blacklisted(&self, token_hash: &str) -> Result<bool, DomainError> {
        Ok(self.ledger.read().await.blacklist.contains_key(token_hash))
    }

    async fn revoke_and_blacklist(
        &self,
        token_hash: &str,
        entry: BlacklistEntry,
    ) -> Result<bool, DomainError> {
        let mut ledger = self.ledger.write().await;

        if let Some(token) = ledger.tokens.get_mut(token_hash) {
            token.revoke();
        }

        if ledger.blacklist.contains_key(&entry.token_hash) {
            return Ok(false);
        }
        ledger.blacklist.insert(entry.token_hash.clone(), entry);
        Ok(true)
    }

    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut ledger = self.ledger.write().await;
        let before = ledger.blacklist.len();
        ledger.blacklist.retain(|_, e| !e.is_expired_at(now));
        Ok(before - ledger.blacklist.len())
    }
}
