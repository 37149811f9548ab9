//! Key material entities: the on-disk key set and the secret derived from it.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Length of the raw symmetric encryption key
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Number of key bytes fed into the token signing secret
pub const DERIVED_SECRET_LEN: usize = 32;

/// Current metadata format version
pub const KEY_METADATA_VERSION: u32 = 1;

/// Metadata persisted alongside the key files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Lowercase hex SHA-256 of the encryption key file bytes
    pub encryption_key_hash: String,
    /// Lowercase hex SHA-256 of the signing key file bytes
    pub signing_key_hash: String,
}

impl KeyMetadata {
    /// Key material is expired once `now` is strictly past `created_at + validity`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now > self.created_at + validity
    }

    /// Whole days until `expires_at`, negative once past it
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days()
    }
}

/// A full key set
///
/// Secret parts are wiped on drop and never printed.
pub struct KeyMaterial {
    pub encryption_key: Zeroizing<[u8; ENCRYPTION_KEY_LEN]>,
    pub signing_key: RsaPrivateKey,
    pub signing_public_key: RsaPublicKey,
    pub metadata: KeyMetadata,
}

impl KeyMaterial {
    pub fn created_at(&self) -> DateTime<Utc> {
        self.metadata.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.metadata.expires_at
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("encryption_key", &"<redacted>")
            .field("signing_key", &"<redacted>")
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Symmetric secret used to sign and verify tokens
///
/// Derived from the first bytes of the encryption key, so it changes
/// whenever the key set rotates.
#[derive(Clone)]
pub struct DerivedSecret(Zeroizing<String>);

impl DerivedSecret {
    pub fn from_key(key: &[u8; ENCRYPTION_KEY_LEN]) -> Self {
        Self(Zeroizing::new(URL_SAFE.encode(&key[..DERIVED_SECRET_LEN])))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl PartialEq for DerivedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for DerivedSecret {}

impl fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedSecret(<redacted>)")
    }
}
