//! Periodic purge of the refresh token ledger and the blacklist
//!
//! Rows whose `expires_at` has passed can no longer change the outcome of a
//! verification: an expired JWT is rejected on its `exp` claim before the
//! ledger or blacklist matter.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::errors::DomainError;
use crate::repositories::TokenRepository;

const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// Seconds between two purges
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_CLEANUP_INTERVAL_SECS,
            enabled: true,
        }
    }
}

/// Deletes expired ledger rows and blacklist entries on a timer
pub struct TokenCleanupService<R: TokenRepository + 'static> {
    repository: Arc<R>,
    config: TokenCleanupConfig,
}

impl<R: TokenRepository> TokenCleanupService<R> {
    pub fn new(repository: Arc<R>, config: TokenCleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Purge everything that expired strictly before `now`
    ///
    /// Both tables are always attempted; a failing one is reported in
    /// [`CleanupResult::errors`] rather than as an `Err`.
    pub async fn run_cleanup(&self, now: DateTime<Utc>) -> Result<CleanupResult, DomainError> {
        let mut result = CleanupResult::default();
        if !self.config.enabled {
            return Ok(result);
        }

        result.expired_tokens_deleted = result.record(
            "refresh tokens",
            self.repository.delete_expired_tokens(now).await,
        );
        result.blacklist_entries_deleted = result.record(
            "blacklist",
            self.repository.cleanup_blacklist(now).await,
        );

        if result.total_cleaned() > 0 {
            info!(
                refresh_tokens = result.expired_tokens_deleted,
                blacklist = result.blacklist_entries_deleted,
                "Purged expired token records"
            );
        } else {
            debug!("Token purge found nothing to delete");
        }

        Ok(result)
    }

    /// Spawn the purge loop; `None` when cleanup is disabled
    ///
    /// The first purge runs immediately. Ticks missed while a purge was
    /// running are not replayed.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup is disabled; expired rows will accumulate");
            return None;
        }

        let period = Duration::from_secs(self.config.interval_seconds.max(1));
        info!(interval_secs = period.as_secs(), "Starting token cleanup task");

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.run_cleanup(Utc::now()).await {
                    Ok(result) if !result.is_success() => {
                        warn!(errors = ?result.errors, "Token purge partially failed");
                    }
                    Ok(_) => {}
                    Err(e) => error!("Token purge failed: {}", e),
                }
            }
        }))
    }
}

/// Outcome of one purge
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub expired_tokens_deleted: usize,
    pub blacklist_entries_deleted: usize,
    /// One message per table that could not be purged
    pub errors: Vec<String>,
}

impl CleanupResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_cleaned(&self) -> usize {
        self.expired_tokens_deleted + self.blacklist_entries_deleted
    }

    fn record(&mut self, table: &str, outcome: Result<usize, DomainError>) -> usize {
        outcome.unwrap_or_else(|e| {
            error!("Failed to purge {}: {}", table, e);
            self.errors.push(format!("{}: {}", table, e));
            0
        })
    }
}
