//! Key lifecycle management
//!
//! This module owns the on-disk key set and everything derived from it:
//! - Atomic, permission-restricted persistence with integrity metadata
//! - Regeneration when the set is missing, corrupted or expired
//! - The token signing secret derived from the current set
//! - Scheduled rotation checks

mod config;
mod engine;
mod generator;
mod scheduler;
mod store;

#[cfg(test)]
mod tests;

pub use config::KeyRotationConfig;
pub use engine::{KeyHealth, KeyRotationEngine, RotationStatus};
pub use generator::{generate_key_material, RSA_KEY_BITS};
pub use scheduler::{KeyRotationScheduler, RotationCheckReport};
pub use store::{
    FileKeyStore, KeyMaterialStore, StoreLock, ENCRYPTION_KEY_FILE, LOCK_FILE, METADATA_FILE,
    SIGNING_KEY_FILE, SIGNING_PUBLIC_KEY_FILE,
};
