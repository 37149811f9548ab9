//! Authentication service module
//!
//! This module provides the account use-cases on top of the token service:
//! - Registration with email and password
//! - Login with bcrypt-hashed passwords
//! - Access token refresh
//! - Logout by revoking the presented tokens

mod config;
mod service;


pub use config::{AuthServiceConfig, MAX_USERNAME_LENGTH};
pub use service::{AuthService, RegisterCommand};
