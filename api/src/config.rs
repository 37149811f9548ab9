use kw_core::services::{
    AuthServiceConfig, KeyRotationConfig, TokenCleanupConfig, TokenServiceConfig,
};
use kw_shared::config::{AppConfig, StorageBackend};

/// Server configuration, with the core service settings derived from it
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
}

impl Config {
    /// Load from the process environment (after `.env` has been applied)
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.is_production()
    }

    pub fn bind_address(&self) -> String {
        self.app.server.bind_address()
    }

    pub fn storage(&self) -> StorageBackend {
        self.app.storage
    }

    pub fn key_rotation(&self) -> KeyRotationConfig {
        KeyRotationConfig::from(&self.app.keys)
    }

    pub fn token_service(&self) -> TokenServiceConfig {
        TokenServiceConfig::from(&self.app.auth.jwt)
    }

    pub fn auth_service(&self) -> AuthServiceConfig {
        AuthServiceConfig::from(&self.app.auth)
    }

    pub fn token_cleanup(&self) -> TokenCleanupConfig {
        TokenCleanupConfig {
            interval_seconds: self.app.keys.token_cleanup_interval_secs,
            enabled: self.app.keys.token_cleanup_interval_secs > 0,
        }
    }
}

impl From<AppConfig> for Config {
    fn from(app: AppConfig) -> Self {
        Self { app }
    }
}
