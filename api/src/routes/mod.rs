//! HTTP route handlers

pub mod auth;
pub mod health;

use std::sync::Arc;

use kw_core::repositories::{TokenRepository, UserRepository};
use kw_core::services::auth::AuthService;
use kw_core::services::keys::KeyRotationEngine;

/// Application state that holds shared services
pub struct AppState<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    pub auth_service: Arc<AuthService<U, T>>,
    pub keys: Arc<KeyRotationEngine>,
}

impl<U, T> AppState<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    pub fn new(auth_service: Arc<AuthService<U, T>>, keys: Arc<KeyRotationEngine>) -> Self {
        Self { auth_service, keys }
    }
}
