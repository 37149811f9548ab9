//! Configuration for key rotation

use std::path::PathBuf;

use chrono::Duration;
use kw_shared::config::KeyConfig;

/// Configuration for the key rotation engine and its scheduler
#[derive(Debug, Clone)]
pub struct KeyRotationConfig {
    /// Directory holding the key files
    pub keys_dir: PathBuf,
    /// Lifetime of a generated key set in days
    pub validity_days: i64,
    /// Days before expiry at which the status turns to expiring soon
    pub expiry_warning_days: i64,
    /// Interval between scheduled rotation checks in seconds
    pub check_interval_secs: u64,
}

impl KeyRotationConfig {
    pub fn validity(&self) -> Duration {
        Duration::days(self.validity_days)
    }

    pub fn with_keys_dir(mut self, keys_dir: impl Into<PathBuf>) -> Self {
        self.keys_dir = keys_dir.into();
        self
    }
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self::from(&KeyConfig::default())
    }
}

impl From<&KeyConfig> for KeyRotationConfig {
    fn from(config: &KeyConfig) -> Self {
        Self {
            keys_dir: config.keys_dir.clone(),
            validity_days: config.validity_days,
            expiry_warning_days: config.expiry_warning_days,
            check_interval_secs: config.rotation_check_interval_secs,
        }
    }
}
