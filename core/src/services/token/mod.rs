//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Issuing access and refresh token pairs signed with the current key set
//! - Verification against the blacklist, signature, expiry and kind
//! - Refresh token ledger checks and revocation
//! - Background cleanup of expired tokens

mod cleanup;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use service::TokenService;
