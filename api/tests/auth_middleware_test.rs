//! Bearer authentication on protected routes

mod common;

use actix_web::{http::header::AUTHORIZATION, http::StatusCode, test};
use serde_json::json;

use kw_api::app::create_app;
use kw_shared::config::{CorsConfig, Environment};

use common::{bearer, into_parts, register_body, setup};

#[actix_web::test]
async fn test_protected_routes_require_bearer() {
    let ctx = setup();
    let app = test::init_service(create_app(
        ctx.state.clone(),
        &CorsConfig::default(),
        Environment::Development,
    ))
    .await;

    let no_header = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let (status, body) = into_parts(test::try_call_service(&app, no_header).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let wrong_scheme = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header((AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0"))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, wrong_scheme).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let logout = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .set_json(json!({}))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, logout).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_refresh_token_is_not_an_access_token() {
    let ctx = setup();
    let app = test::init_service(create_app(
        ctx.state.clone(),
        &CorsConfig::default(),
        Environment::Development,
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(register_body("alice@example.com"))
        .to_request();
    let (_, body) = into_parts(test::try_call_service(&app, req).await).await;
    let refresh = body["tokens"]["refresh"].as_str().unwrap().to_string();

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&refresh))
        .to_request();
    let (status, body) = into_parts(test::try_call_service(&app, me).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn test_tampered_token_is_rejected() {
    let ctx = setup();
    let app = test::init_service(create_app(
        ctx.state.clone(),
        &CorsConfig::default(),
        Environment::Development,
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(register_body("alice@example.com"))
        .to_request();
    let (_, body) = into_parts(test::try_call_service(&app, req).await).await;
    let access = body["tokens"]["access"].as_str().unwrap().to_string();

    // Swap the signature for one that cannot match
    let (unsigned, _) = access.rsplit_once('.').unwrap();
    let forged = format!("{}.{}", unsigned, "AAAA");

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&forged))
        .to_request();
    let (status, body) = into_parts(test::try_call_service(&app, me).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn test_logout_without_body_blacklists_access_token() {
    let ctx = setup();
    let app = test::init_service(create_app(
        ctx.state.clone(),
        &CorsConfig::default(),
        Environment::Development,
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(register_body("alice@example.com"))
        .to_request();
    let (_, body) = into_parts(test::try_call_service(&app, req).await).await;
    let access = body["tokens"]["access"].as_str().unwrap().to_string();
    let refresh = body["tokens"]["refresh"].as_str().unwrap().to_string();

    let logout = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&access))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, logout).await).await;
    assert_eq!(status, StatusCode::OK);

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&access))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, me).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The refresh token was not presented, so it survives
    let refreshed = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, refreshed).await).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_key_outage_fails_closed() {
    let ctx = setup();
    let app = test::init_service(create_app(
        ctx.state.clone(),
        &CorsConfig::default(),
        Environment::Development,
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(register_body("alice@example.com"))
        .to_request();
    let (_, body) = into_parts(test::try_call_service(&app, req).await).await;
    let access = body["tokens"]["access"].as_str().unwrap().to_string();

    ctx.keys.shutdown();

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&access))
        .to_request();
    let (status, body) = into_parts(test::try_call_service(&app, me).await).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "KEYS_UNAVAILABLE");

    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "alice@example.com", "password": "correct-horse-battery"}))
        .to_request();
    let (status, _) = into_parts(test::try_call_service(&app, login).await).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
