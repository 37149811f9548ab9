//! Mock implementation of TokenRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{BlacklistEntry, RefreshToken};
use crate::errors::DomainError;

use super::r#trait::TokenRepository;

#[derive(Default)]
struct MockState {
    tokens: HashMap<String, RefreshToken>,
    blacklist: HashMap<String, BlacklistEntry>,
}

/// Mock token repository for testing
pub struct MockTokenRepository {
    state: Arc<RwLock<MockState>>,
    fail_writes: AtomicBool,
    fail_revocations: AtomicBool,
}

impl MockTokenRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            fail_writes: AtomicBool::new(false),
            fail_revocations: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with an internal error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only `revoke_and_blacklist` fail with an internal error
    pub fn set_fail_revocations(&self, fail: bool) {
        self.fail_revocations.store(fail, Ordering::SeqCst);
    }

    /// Move a ledger row's expiry, for exercising ledger-side expiry
    pub async fn set_token_expiry(&self, token_hash: &str, expires_at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        if let Some(token) = state.tokens.get_mut(token_hash) {
            token.expires_at = expires_at;
        }
    }

    pub async fn token_count(&self) -> usize {
        self.state.read().await.tokens.len()
    }

    pub async fn blacklist_count(&self) -> usize {
        self.state.read().await.blacklist.len()
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::internal("mock storage unavailable"));
        }
        Ok(())
    }
}

impl Default for MockTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        if state.tokens.contains_key(&token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }

        state.tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        Ok(self.state.read().await.tokens.get(token_hash).cloned())
    }

    async fn find_by_user_id(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_valid_at(now))
            .cloned()
            .collect())
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        match state.tokens.get_mut(token_hash) {
            Some(token) => {
                token.revoke();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let mut count = 0;
        for token in state.tokens.values_mut() {
            if token.user_id == user_id && !token.is_revoked {
                token.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok(before - state.tokens.len())
    }

    async fn blacklist_token(&self, entry: BlacklistEntry) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        if state.blacklist.contains_key(&entry.token_hash) {
            return Ok(false);
        }
        state.blacklist.insert(entry.token_hash.clone(), entry);
        Ok(true)
    }

    async fn is_token_blacklisted(&self, token_hash: &str) -> Result<bool, DomainError> {
        Ok(self.state.read().await.blacklist.contains_key(token_hash))
    }

    async fn revoke_and_blacklist(
        &self,
        token_hash: &str,
        entry: BlacklistEntry,
    ) -> Result<bool, DomainError> {
        self.check_writable()?;
        if self.fail_revocations.load(Ordering::SeqCst) {
            return Err(DomainError::internal("mock revocation failed"));
        }
        let mut state = self.state.write().await;
        if let Some(token) = state.tokens.get_mut(token_hash) {
            token.revoke();
        }
        if state.blacklist.contains_key(&entry.token_hash) {
            return Ok(false);
        }
        state.blacklist.insert(entry.token_hash.clone(), entry);
        Ok(true)
    }

    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let before = state.blacklist.len();
        state.blacklist.retain(|_, e| !e.is_expired_at(now));
        Ok(before - state.blacklist.len())
    }
}
