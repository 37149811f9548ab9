//! Business services containing domain logic and use cases.

pub mod auth;
pub mod keys;
pub mod token;

// Re-export commonly used types
pub use auth::{AuthService, AuthServiceConfig, RegisterCommand};
pub use keys::{
    FileKeyStore, KeyHealth, KeyMaterialStore, KeyRotationConfig, KeyRotationEngine,
    KeyRotationScheduler, RotationCheckReport, RotationStatus,
};
pub use token::{CleanupResult, TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig};
