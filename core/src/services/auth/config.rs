//! Configuration for the authentication service

use kw_shared::config::AuthConfig;
use kw_shared::validation::MAX_PASSWORD_LENGTH;

/// Longest accepted username
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Configuration for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Minimum accepted password length in characters
    pub min_password_length: usize,
    /// Maximum accepted password length in characters
    pub max_password_length: usize,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for AuthServiceConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            bcrypt_cost: config.bcrypt_cost,
            min_password_length: config.min_password_length,
            max_password_length: MAX_PASSWORD_LENGTH,
        }
    }
}

impl AuthServiceConfig {
    /// Use a different bcrypt cost (tests use the minimum)
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}
