//! Periodic key rotation checks
//!
//! The check itself is synchronous (it may generate an RSA key), so the
//! background loop runs it on the blocking pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::engine::{KeyRotationEngine, RotationStatus};

/// Result of one scheduled check
#[derive(Debug, Clone)]
pub struct RotationCheckReport {
    pub checked_at: DateTime<Utc>,
    pub status: Option<RotationStatus>,
    pub error: Option<String>,
}

impl RotationCheckReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs `check_rotation_status` on an interval and logs the outcome
pub struct KeyRotationScheduler {
    engine: Arc<KeyRotationEngine>,
    interval_secs: u64,
}

impl KeyRotationScheduler {
    pub fn new(engine: Arc<KeyRotationEngine>) -> Self {
        let interval_secs = engine.config().check_interval_secs;
        Self {
            engine,
            interval_secs,
        }
    }

    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Run a single check; never panics
    pub fn run_check(&self, now: DateTime<Utc>) -> RotationCheckReport {
        match self.engine.check_rotation_status(now) {
            Ok(status) => {
                match status {
                    RotationStatus::Valid { days_left } => {
                        info!("Key material valid, {} days until expiry", days_left)
                    }
                    RotationStatus::ExpiringSoon { days_left } => {
                        warn!("Key material expires in {} days", days_left)
                    }
                    RotationStatus::Regenerated { expires_at } => {
                        warn!("Key material was regenerated, new set expires at {}", expires_at)
                    }
                }
                RotationCheckReport {
                    checked_at: now,
                    status: Some(status),
                    error: None,
                }
            }
            Err(e) => {
                error!("Key rotation check failed: {}", e);
                RotationCheckReport {
                    checked_at: now,
                    status: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Start the check loop as a background task
    ///
    /// The first tick fires immediately.
    pub fn start_background_task(self: Arc<Self>) -> JoinHandle<()> {
        let period = std::time::Duration::from_secs(self.interval_secs.max(1));

        tokio::spawn(async move {
            info!(
                "Key rotation scheduler started - will check every {} seconds",
                self.interval_secs
            );

            let mut interval_timer = tokio::time::interval(period);

            loop {
                interval_timer.tick().await;

                let scheduler = Arc::clone(&self);
                let check = tokio::task::spawn_blocking(move || scheduler.run_check(Utc::now()));
                if let Err(e) = check.await {
                    error!("Key rotation check task failed: {}", e);
                }
            }
        })
    }
}
