//! Key rotation engine
//!
//! Owns the process-wide current key set. Every regeneration happens under
//! the engine mutex and the store lock, so concurrent callers never see a
//! half-written set and at most one of them regenerates.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::config::KeyRotationConfig;
use super::generator::generate_key_material;
use super::store::{FileKeyStore, KeyMaterialStore};
use crate::domain::entities::key_material::{DerivedSecret, KeyMaterial};
use crate::errors::KeyError;

/// Outcome of a rotation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    /// The current set is valid for `days_left` more days
    Valid { days_left: i64 },
    /// The current set is inside the warning window
    ExpiringSoon { days_left: i64 },
    /// A new set was generated during the check
    Regenerated { expires_at: DateTime<Utc> },
}

/// Key health as seen from the cache, without touching the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHealth {
    Healthy { expires_at: DateTime<Utc> },
    ExpiringSoon { expires_at: DateTime<Utc>, days_left: i64 },
    Expired { expires_at: DateTime<Utc> },
    Unavailable,
}

impl KeyHealth {
    pub fn label(&self) -> &'static str {
        match self {
            KeyHealth::Healthy { .. } => "healthy",
            KeyHealth::ExpiringSoon { .. } => "expiring_soon",
            KeyHealth::Expired { .. } => "expired",
            KeyHealth::Unavailable => "unavailable",
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            KeyHealth::Healthy { expires_at }
            | KeyHealth::ExpiringSoon { expires_at, .. }
            | KeyHealth::Expired { expires_at } => Some(*expires_at),
            KeyHealth::Unavailable => None,
        }
    }

    /// Whether tokens can be issued and verified
    pub fn is_usable(&self) -> bool {
        matches!(self, KeyHealth::Healthy { .. } | KeyHealth::ExpiringSoon { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Live,
    Shutdown,
}

struct EngineState {
    lifecycle: Lifecycle,
    current: Option<Arc<KeyMaterial>>,
}

/// Owner of the current key material
pub struct KeyRotationEngine {
    store: Arc<dyn KeyMaterialStore>,
    config: KeyRotationConfig,
    state: Mutex<EngineState>,
}

impl KeyRotationEngine {
    pub fn new(store: Arc<dyn KeyMaterialStore>, config: KeyRotationConfig) -> Self {
        Self {
            store,
            config,
            state: Mutex::new(EngineState {
                lifecycle: Lifecycle::Uninitialized,
                current: None,
            }),
        }
    }

    /// Engine over a `FileKeyStore` in `config.keys_dir`
    pub fn with_file_store(config: KeyRotationConfig) -> Self {
        let store = FileKeyStore::new(config.keys_dir.clone(), config.validity());
        Self::new(Arc::new(store), config)
    }

    pub fn config(&self) -> &KeyRotationConfig {
        &self.config
    }

    /// Load or create a valid key set and mark the engine live
    pub fn init(&self, now: DateTime<Utc>) -> Result<Arc<KeyMaterial>, KeyError> {
        let material = self.ensure_valid_keys(now)?;
        info!(
            "Key rotation engine initialised, keys expire at {}",
            material.expires_at()
        );
        Ok(material)
    }

    /// Return valid key material, regenerating it if the stored set is
    /// missing, corrupted or expired
    ///
    /// Valid material is returned without writing anything. If regeneration
    /// fails the cached material is dropped so verification fails closed.
    pub fn ensure_valid_keys(&self, now: DateTime<Utc>) -> Result<Arc<KeyMaterial>, KeyError> {
        let mut state = self.lock_state()?;
        if state.lifecycle == Lifecycle::Shutdown {
            return Err(KeyError::Unavailable);
        }

        match self.ensure_locked(&mut state, now) {
            Ok((material, _)) => Ok(material),
            Err(e) => {
                error!("Failed to ensure valid key material: {}", e);
                state.current = None;
                Err(e)
            }
        }
    }

    /// Unconditionally replace the key set
    ///
    /// On failure the previous material stays in use.
    pub fn force_rotate(&self, now: DateTime<Utc>) -> Result<Arc<KeyMaterial>, KeyError> {
        let mut state = self.lock_state()?;
        if state.lifecycle == Lifecycle::Shutdown {
            return Err(KeyError::Unavailable);
        }

        let _store_lock = self.store.lock()?;
        match self.regenerate(&mut state, now) {
            Ok(material) => {
                info!("Key material force-rotated, new set expires at {}", material.expires_at());
                Ok(material)
            }
            Err(e) => {
                error!("Forced key rotation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Token signing secret for `material`
    pub fn derive_secret(material: &KeyMaterial) -> DerivedSecret {
        DerivedSecret::from_key(&material.encryption_key)
    }

    /// Cached material, loaded on first use
    pub fn current_material(&self, now: DateTime<Utc>) -> Result<Arc<KeyMaterial>, KeyError> {
        {
            let state = self.lock_state()?;
            match (state.lifecycle, &state.current) {
                (Lifecycle::Shutdown, _) => return Err(KeyError::Unavailable),
                (_, Some(material)) => return Ok(Arc::clone(material)),
                _ => {}
            }
        }
        self.ensure_valid_keys(now)
    }

    /// Secret for verifying tokens, from the cached material
    pub fn current_secret(&self, now: DateTime<Utc>) -> Result<DerivedSecret, KeyError> {
        let material = self.current_material(now)?;
        Ok(Self::derive_secret(&material))
    }

    /// Validate the stored set, regenerating if needed, and classify it
    pub fn check_rotation_status(&self, now: DateTime<Utc>) -> Result<RotationStatus, KeyError> {
        let mut state = self.lock_state()?;
        if state.lifecycle == Lifecycle::Shutdown {
            return Err(KeyError::Unavailable);
        }

        let (material, regenerated) = match self.ensure_locked(&mut state, now) {
            Ok(result) => result,
            Err(e) => {
                state.current = None;
                return Err(e);
            }
        };

        if regenerated {
            return Ok(RotationStatus::Regenerated {
                expires_at: material.expires_at(),
            });
        }

        let days_left = material.metadata.days_until_expiry(now);
        if days_left <= self.config.expiry_warning_days {
            Ok(RotationStatus::ExpiringSoon { days_left })
        } else {
            Ok(RotationStatus::Valid { days_left })
        }
    }

    /// Health of the cached set at `now`
    pub fn cached_status(&self, now: DateTime<Utc>) -> KeyHealth {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return KeyHealth::Unavailable,
        };
        if state.lifecycle == Lifecycle::Shutdown {
            return KeyHealth::Unavailable;
        }

        match &state.current {
            None => KeyHealth::Unavailable,
            Some(material) => {
                let expires_at = material.expires_at();
                let days_left = material.metadata.days_until_expiry(now);
                if material.metadata.is_expired_at(now, self.config.validity()) {
                    KeyHealth::Expired { expires_at }
                } else if days_left <= self.config.expiry_warning_days {
                    KeyHealth::ExpiringSoon {
                        expires_at,
                        days_left,
                    }
                } else {
                    KeyHealth::Healthy { expires_at }
                }
            }
        }
    }

    /// Drop the cached material; every later request fails closed
    pub fn shutdown(&self) {
        match self.state.lock() {
            Ok(mut state) => {
                state.lifecycle = Lifecycle::Shutdown;
                state.current = None;
            }
            Err(poisoned) => {
                let mut state = poisoned.into_inner();
                state.lifecycle = Lifecycle::Shutdown;
                state.current = None;
            }
        }
        info!("Key rotation engine shut down");
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, EngineState>, KeyError> {
        self.state.lock().map_err(|_| {
            error!("Key engine state lock poisoned");
            KeyError::Unavailable
        })
    }

    /// Load and validate, regenerating on any failure; the flag reports
    /// whether a new set was written
    fn ensure_locked(
        &self,
        state: &mut EngineState,
        now: DateTime<Utc>,
    ) -> Result<(Arc<KeyMaterial>, bool), KeyError> {
        let _store_lock = self.store.lock()?;

        let loaded = self
            .store
            .load()
            .and_then(|material| self.store.validate(&material, now).map(|_| material));

        match loaded {
            Ok(material) => {
                let material = match &state.current {
                    Some(cached) if cached.metadata == material.metadata => Arc::clone(cached),
                    _ => Arc::new(material),
                };
                state.current = Some(Arc::clone(&material));
                state.lifecycle = Lifecycle::Live;
                Ok((material, false))
            }
            Err(reason) => {
                match &reason {
                    KeyError::NotFound { path } => {
                        info!("No key material at {}, generating a new set", path)
                    }
                    other => warn!("Stored key material unusable ({}), regenerating", other),
                }
                let material = self.regenerate(state, now)?;
                Ok((material, true))
            }
        }
    }

    /// Generate and persist a new set; caller holds both locks
    fn regenerate(
        &self,
        state: &mut EngineState,
        now: DateTime<Utc>,
    ) -> Result<Arc<KeyMaterial>, KeyError> {
        let material = generate_key_material(now, self.config.validity())?;
        self.store.persist(&material)?;

        let material = Arc::new(material);
        state.current = Some(Arc::clone(&material));
        state.lifecycle = Lifecycle::Live;
        info!("Generated new key material, expires at {}", material.expires_at());
        Ok(material)
    }
}
