//! Persistence of key material
//!
//! `FileKeyStore` keeps one key set in a directory:
//!
//! - `encryption.key`      URL-safe base64 of the 32-byte symmetric key
//! - `signing.key`         RSA private key, PKCS#8 PEM
//! - `signing_public.key`  RSA public key, SubjectPublicKeyInfo PEM
//! - `key_metadata.json`   creation time, expiry and hashes of the two key files
//!
//! Files are replaced through temporary siblings and renames, key files first
//! and metadata last. A crash between renames leaves hashes that no longer
//! match, which `verify_integrity` reports as corruption.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::generator::encode_keys;
use crate::domain::sha256_hex;
use crate::domain::entities::key_material::{
    KeyMaterial, KeyMetadata, ENCRYPTION_KEY_LEN, KEY_METADATA_VERSION,
};
use crate::errors::KeyError;

pub const ENCRYPTION_KEY_FILE: &str = "encryption.key";
pub const SIGNING_KEY_FILE: &str = "signing.key";
pub const SIGNING_PUBLIC_KEY_FILE: &str = "signing_public.key";
pub const METADATA_FILE: &str = "key_metadata.json";
pub const LOCK_FILE: &str = ".keys.lock";

/// Held while key material is read-checked or replaced
///
/// Dropping the guard releases the lock.
pub struct StoreLock {
    _file: Option<File>,
}

impl StoreLock {
    /// A lock that guards nothing, for stores without cross-process access
    pub fn noop() -> Self {
        Self { _file: None }
    }
}

/// Storage backend for the active key set
pub trait KeyMaterialStore: Send + Sync {
    /// Read the persisted key set
    ///
    /// # Returns
    /// * `Err(KeyError::NotFound)` - Any of the files is missing
    /// * `Err(KeyError::Corrupted)` - A file exists but does not parse
    /// * `Err(KeyError::Io)` - Any other read failure
    fn load(&self) -> Result<KeyMaterial, KeyError>;

    /// Whether the persisted files still match `material`'s metadata
    fn verify_integrity(&self, material: &KeyMaterial) -> bool;

    /// Whether `material` is past its validity window at `now`
    fn is_expired(&self, material: &KeyMaterial, now: DateTime<Utc>) -> bool;

    /// Replace the persisted key set with `material`
    fn persist(&self, material: &KeyMaterial) -> Result<(), KeyError>;

    /// Take the store-wide exclusive lock
    fn lock(&self) -> Result<StoreLock, KeyError> {
        Ok(StoreLock::noop())
    }

    /// Integrity and expiry in one check
    fn validate(&self, material: &KeyMaterial, now: DateTime<Utc>) -> Result<(), KeyError> {
        if !self.verify_integrity(material) {
            return Err(KeyError::Corrupted {
                reason: "key files do not match metadata".to_string(),
            });
        }
        if self.is_expired(material, now) {
            return Err(KeyError::Expired);
        }
        Ok(())
    }
}

/// Filesystem-backed key store
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
    validity: Duration,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>, validity: Duration) -> Self {
        Self {
            dir: dir.into(),
            validity,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, KeyError> {
        let path = self.path(name);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => KeyError::NotFound {
                path: path.display().to_string(),
            },
            _ => KeyError::Io(e),
        })
    }

    fn ensure_dir(&self) -> Result<(), KeyError> {
        fs::create_dir_all(&self.dir)?;
        set_permissions(&self.dir, 0o700)?;
        Ok(())
    }

    /// Write `contents` to `name` through a temporary sibling and a rename
    fn write_atomic(&self, name: &str, contents: &[u8]) -> Result<(), KeyError> {
        let target = self.path(name);
        let tmp = self.path(&format!(".{}.tmp", name));

        {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        set_permissions(&tmp, 0o600)?;
        fs::rename(&tmp, &target)?;

        debug!("Wrote key file {}", target.display());
        Ok(())
    }

    fn sync_dir(&self) {
        #[cfg(unix)]
        {
            if let Err(e) = File::open(&self.dir).and_then(|dir| dir.sync_all()) {
                warn!("Failed to sync key directory {}: {}", self.dir.display(), e);
            }
        }
    }
}

impl KeyMaterialStore for FileKeyStore {
    fn load(&self) -> Result<KeyMaterial, KeyError> {
        let encryption_raw = Zeroizing::new(self.read_file(ENCRYPTION_KEY_FILE)?);
        let signing_raw = Zeroizing::new(self.read_file(SIGNING_KEY_FILE)?);
        let public_raw = self.read_file(SIGNING_PUBLIC_KEY_FILE)?;
        let metadata_raw = self.read_file(METADATA_FILE)?;

        let metadata: KeyMetadata = serde_json::from_slice(&metadata_raw).map_err(|e| {
            KeyError::Corrupted {
                reason: format!("metadata is not valid JSON: {}", e),
            }
        })?;
        if metadata.version != KEY_METADATA_VERSION {
            return Err(KeyError::Corrupted {
                reason: format!("unsupported metadata version {}", metadata.version),
            });
        }

        let encryption_key = decode_encryption_key(&encryption_raw)?;

        let signing_pem = std::str::from_utf8(&signing_raw).map_err(|_| KeyError::Corrupted {
            reason: "signing key is not UTF-8".to_string(),
        })?;
        let signing_key =
            RsaPrivateKey::from_pkcs8_pem(signing_pem).map_err(|e| KeyError::Corrupted {
                reason: format!("signing key does not parse: {}", e),
            })?;

        let public_pem = std::str::from_utf8(&public_raw).map_err(|_| KeyError::Corrupted {
            reason: "public key is not UTF-8".to_string(),
        })?;
        let signing_public_key =
            RsaPublicKey::from_public_key_pem(public_pem).map_err(|e| KeyError::Corrupted {
                reason: format!("public key does not parse: {}", e),
            })?;

        Ok(KeyMaterial {
            encryption_key,
            signing_key,
            signing_public_key,
            metadata,
        })
    }

    fn verify_integrity(&self, material: &KeyMaterial) -> bool {
        match self.check_files(material) {
            Ok(()) => true,
            Err(reason) => {
                warn!("Key integrity check failed: {}", reason);
                false
            }
        }
    }

    fn is_expired(&self, material: &KeyMaterial, now: DateTime<Utc>) -> bool {
        material.metadata.is_expired_at(now, self.validity)
    }

    fn persist(&self, material: &KeyMaterial) -> Result<(), KeyError> {
        self.ensure_dir()?;

        let encoded = encode_keys(&material.encryption_key, &material.signing_key)?;
        let metadata = serde_json::to_vec_pretty(&material.metadata).map_err(|e| {
            KeyError::Generation {
                reason: format!("failed to encode metadata: {}", e),
            }
        })?;

        self.write_atomic(ENCRYPTION_KEY_FILE, encoded.encryption_key.as_bytes())?;
        self.write_atomic(SIGNING_KEY_FILE, encoded.signing_key.as_bytes())?;
        self.write_atomic(SIGNING_PUBLIC_KEY_FILE, encoded.signing_public_key.as_bytes())?;
        self.write_atomic(METADATA_FILE, &metadata)?;
        self.sync_dir();

        info!(
            "Persisted key material to {} (expires {})",
            self.dir.display(),
            material.metadata.expires_at
        );
        Ok(())
    }

    fn lock(&self) -> Result<StoreLock, KeyError> {
        self.ensure_dir()?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path(LOCK_FILE))?;
        fs4::fs_std::FileExt::lock_exclusive(&file)?;
        Ok(StoreLock { _file: Some(file) })
    }
}

impl FileKeyStore {
    fn check_files(&self, material: &KeyMaterial) -> Result<(), String> {
        let read = |name: &str| fs::read(self.path(name)).map_err(|e| format!("{}: {}", name, e));

        let encryption_raw = Zeroizing::new(read(ENCRYPTION_KEY_FILE)?);
        if sha256_hex(&encryption_raw) != material.metadata.encryption_key_hash {
            return Err("encryption key hash mismatch".to_string());
        }
        if URL_SAFE.encode(&material.encryption_key[..]).as_bytes() != encryption_raw.as_slice() {
            return Err("encryption key differs from loaded material".to_string());
        }

        let signing_raw = Zeroizing::new(read(SIGNING_KEY_FILE)?);
        if sha256_hex(&signing_raw) != material.metadata.signing_key_hash {
            return Err("signing key hash mismatch".to_string());
        }

        let public_raw = read(SIGNING_PUBLIC_KEY_FILE)?;
        let public_pem = std::str::from_utf8(&public_raw).map_err(|_| "public key is not UTF-8")?;
        let stored_public = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| format!("public key does not parse: {}", e))?;
        if stored_public != RsaPublicKey::from(&material.signing_key) {
            return Err("public key does not match signing key".to_string());
        }

        Ok(())
    }
}

fn decode_encryption_key(raw: &[u8]) -> Result<Zeroizing<[u8; ENCRYPTION_KEY_LEN]>, KeyError> {
    let text = std::str::from_utf8(raw).map_err(|_| KeyError::Corrupted {
        reason: "encryption key is not UTF-8".to_string(),
    })?;
    let decoded = Zeroizing::new(URL_SAFE.decode(text.trim()).map_err(|e| KeyError::Corrupted {
        reason: format!("encryption key is not base64: {}", e),
    })?);
    if decoded.len() != ENCRYPTION_KEY_LEN {
        return Err(KeyError::Corrupted {
            reason: format!(
                "encryption key has {} bytes, expected {}",
                decoded.len(),
                ENCRYPTION_KEY_LEN
            ),
        });
    }

    let mut key = Zeroizing::new([0u8; ENCRYPTION_KEY_LEN]);
    key.copy_from_slice(&decoded);
    Ok(key)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
