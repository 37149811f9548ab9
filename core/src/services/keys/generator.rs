//! Key set generation and the on-disk encodings shared with the store

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::domain::sha256_hex;
use crate::domain::entities::key_material::{
    KeyMaterial, KeyMetadata, ENCRYPTION_KEY_LEN, KEY_METADATA_VERSION,
};
use crate::errors::KeyError;

/// RSA modulus size for the signing key pair
pub const RSA_KEY_BITS: usize = 2048;

/// File contents of a key set, exactly as written to disk
pub(crate) struct EncodedKeys {
    pub encryption_key: Zeroizing<String>,
    pub signing_key: Zeroizing<String>,
    pub signing_public_key: String,
}

/// Lowercase hex SHA-256
pub(crate) fn encode_keys(
    encryption_key: &[u8; ENCRYPTION_KEY_LEN],
    signing_key: &RsaPrivateKey,
) -> Result<EncodedKeys, KeyError> {
    let signing_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation {
            reason: format!("failed to encode signing key: {}", e),
        })?;

    let public_pem = RsaPublicKey::from(signing_key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation {
            reason: format!("failed to encode public key: {}", e),
        })?;

    Ok(EncodedKeys {
        encryption_key: Zeroizing::new(URL_SAFE.encode(encryption_key)),
        signing_key: Zeroizing::new(signing_pem.to_string()),
        signing_public_key: public_pem,
    })
}

/// Generates a complete key set valid from `now` for `validity`
///
/// The metadata hashes are computed over the exact bytes the store writes.
pub fn generate_key_material(now: DateTime<Utc>, validity: Duration) -> Result<KeyMaterial, KeyError> {
    let mut encryption_key = Zeroizing::new([0u8; ENCRYPTION_KEY_LEN]);
    OsRng
        .try_fill_bytes(&mut encryption_key[..])
        .map_err(|e| KeyError::Generation {
            reason: format!("random source failed: {}", e),
        })?;

    let signing_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).map_err(|e| KeyError::Generation {
        reason: format!("RSA key generation failed: {}", e),
    })?;
    let signing_public_key = RsaPublicKey::from(&signing_key);

    let encoded = encode_keys(&encryption_key, &signing_key)?;

    let metadata = KeyMetadata {
        version: KEY_METADATA_VERSION,
        created_at: now,
        expires_at: now + validity,
        encryption_key_hash: sha256_hex(encoded.encryption_key.as_bytes()),
        signing_key_hash: sha256_hex(encoded.signing_key.as_bytes()),
    };

    Ok(KeyMaterial {
        encryption_key,
        signing_key,
        signing_public_key,
        metadata,
    })
}
