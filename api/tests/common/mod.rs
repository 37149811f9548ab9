//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody, dev::ServiceResponse, http::StatusCode, test, web,
};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;

use kw_api::routes::AppState;
use kw_core::services::{
    AuthService, AuthServiceConfig, KeyRotationConfig, KeyRotationEngine, TokenService,
    TokenServiceConfig,
};
use kw_infra::{InMemoryTokenRepository, InMemoryUserRepository};

pub type State = AppState<InMemoryUserRepository, InMemoryTokenRepository>;

pub struct TestContext {
    pub keys: Arc<KeyRotationEngine>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub state: web::Data<State>,
    _dir: TempDir,
}

/// Fresh key directory, in-memory stores and the cheapest bcrypt cost
pub fn setup() -> TestContext {
    let dir = TempDir::new().unwrap();
    let keys = Arc::new(KeyRotationEngine::with_file_store(
        KeyRotationConfig::default().with_keys_dir(dir.path().join("keys")),
    ));
    keys.init(Utc::now()).unwrap();

    let users = Arc::new(InMemoryUserRepository::new());
    let tokens = Arc::new(InMemoryTokenRepository::new());
    let token_service = Arc::new(TokenService::new(
        Arc::clone(&tokens),
        Arc::clone(&users),
        Arc::clone(&keys),
        TokenServiceConfig::default(),
    ));
    let auth_service = Arc::new(AuthService::new(
        users,
        token_service,
        AuthServiceConfig::default().with_bcrypt_cost(4),
    ));

    TestContext {
        state: web::Data::new(AppState::new(auth_service, Arc::clone(&keys))),
        keys,
        tokens,
        _dir: dir,
    }
}

/// Status and JSON body of a call, whether the stack answered or errored
pub async fn into_parts<B: MessageBody>(
    result: Result<ServiceResponse<B>, actix_web::Error>,
) -> (StatusCode, Value) {
    let (status, bytes) = match result {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
            (status, bytes)
        }
    };
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub fn register_body(email: &str) -> Value {
    serde_json::json!({
        "email": email,
        "username": "alice",
        "password": "correct-horse-battery"
    })
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {}", token),
    )
}
