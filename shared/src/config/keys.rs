//! Key material configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::env_or;

/// Where key material lives and how long it stays valid
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyConfig {
    /// Directory holding the key files and metadata
    pub keys_dir: PathBuf,

    /// Days a freshly generated key set stays valid
    pub validity_days: i64,

    /// Remaining days at or below which the set is reported as expiring soon
    pub expiry_warning_days: i64,

    /// Seconds between scheduled rotation checks
    pub rotation_check_interval_secs: u64,

    /// Seconds between ledger/blacklist cleanup runs
    pub token_cleanup_interval_secs: u64,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("keys"),
            validity_days: 730,
            expiry_warning_days: 30,
            rotation_check_interval_secs: 86_400,
            token_cleanup_interval_secs: 3_600,
        }
    }
}

impl KeyConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            keys_dir: std::env::var("KEYS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.keys_dir),
            validity_days: env_or("KEY_VALIDITY_DAYS", defaults.validity_days),
            expiry_warning_days: env_or("KEY_EXPIRY_WARNING_DAYS", defaults.expiry_warning_days),
            rotation_check_interval_secs: env_or(
                "KEY_CHECK_INTERVAL_SECS",
                defaults.rotation_check_interval_secs,
            ),
            token_cleanup_interval_secs: env_or(
                "TOKEN_CLEANUP_INTERVAL_SECS",
                defaults.token_cleanup_interval_secs,
            ),
        }
    }

    /// Use a different key directory
    pub fn with_keys_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.keys_dir = dir.into();
        self
    }
}
