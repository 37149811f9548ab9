//! HTTP surface of the Keyward backend
//!
//! Exposed as a library so the integration tests and the admin binary share
//! the server's routing, DTOs and configuration.

pub mod app;
pub mod config;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
