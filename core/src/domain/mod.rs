//! Domain layer containing business entities.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256, used for token hashes and key file fingerprints
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
