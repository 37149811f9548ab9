//! Unit tests for token service

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::domain::entities::token::{hash_token, Claims, RevokeOutcome, TokenKind};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError, KeyError, TokenError};
use crate::repositories::{MockTokenRepository, MockUserRepository, TokenRepository, UserRepository};
use crate::services::keys::{KeyRotationConfig, KeyRotationEngine};
use crate::services::token::{TokenService, TokenServiceConfig};

struct Harness {
    _dir: TempDir,
    tokens: Arc<MockTokenRepository>,
    users: Arc<MockUserRepository>,
    engine: Arc<KeyRotationEngine>,
    service: TokenService<MockTokenRepository, MockUserRepository>,
    user: User,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
}

async fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let config = KeyRotationConfig::default().with_keys_dir(dir.path().join("keys"));
    let engine = Arc::new(KeyRotationEngine::with_file_store(config));
    engine.init(now()).unwrap();

    let tokens = Arc::new(MockTokenRepository::new());
    let users = Arc::new(MockUserRepository::new());
    let user = User::new("u1@example.com", "u1", "hash", now());
    users.insert(user.clone()).await;

    let service = TokenService::new(
        Arc::clone(&tokens),
        Arc::clone(&users),
        Arc::clone(&engine),
        TokenServiceConfig::default(),
    );

    Harness {
        _dir: dir,
        tokens,
        users,
        engine,
        service,
        user,
    }
}

fn token_error(result: Result<impl std::fmt::Debug, DomainError>) -> TokenError {
    match result {
        Err(DomainError::Token(e)) => e,
        other => panic!("expected token error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_issue_and_verify() {
    let h = harness().await;

    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    assert_eq!(pair.access_expires_in, 15 * 60);
    assert_eq!(pair.refresh_expires_in, 366 * 86_400);
    assert_ne!(pair.access_token, pair.refresh_token);

    let claims = h
        .service
        .verify(&pair.access_token, TokenKind::Access, now())
        .await
        .unwrap();
    assert_eq!(claims.sub, h.user.id.to_string());
    assert_eq!(claims.email, "u1@example.com");
    assert_eq!(claims.token_type, TokenKind::Access);

    let refresh_claims = h
        .service
        .verify(&pair.refresh_token, TokenKind::Refresh, now())
        .await
        .unwrap();
    assert_eq!(refresh_claims.exp - refresh_claims.iat, 366 * 86_400);
}

#[tokio::test]
async fn test_ledger_row_stored_with_issue() {
    let h = harness().await;

    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let row = h
        .tokens
        .find_refresh_token(&hash_token(&pair.refresh_token))
        .await
        .unwrap()
        .expect("ledger row");
    assert_eq!(row.user_id, h.user.id);
    assert_eq!(row.created_at, now());
    assert_eq!(row.expires_at, now() + Duration::days(366));
    assert!(!row.is_revoked);
    assert!(h
        .tokens
        .find_refresh_token(&hash_token(&pair.access_token))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_access_token_expiry_and_refresh() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let at_15 = now() + Duration::minutes(15);
    assert!(h
        .service
        .verify(&pair.access_token, TokenKind::Access, at_15)
        .await
        .is_ok());

    let at_16 = now() + Duration::minutes(16);
    assert!(matches!(
        token_error(h.service.verify(&pair.access_token, TokenKind::Access, at_16).await),
        TokenError::TokenExpired
    ));

    let fresh = h
        .service
        .refresh_access_token(&pair.refresh_token, at_16)
        .await
        .unwrap();
    assert_eq!(fresh.expires_at, at_16 + Duration::minutes(15));
    let claims = h
        .service
        .verify(&fresh.token, TokenKind::Access, at_16)
        .await
        .unwrap();
    assert_eq!(claims.sub, h.user.id.to_string());
}

#[tokio::test]
async fn test_rotation_invalidates_tokens() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    h.engine.force_rotate(now()).unwrap();

    assert!(matches!(
        token_error(h.service.verify(&pair.access_token, TokenKind::Access, now()).await),
        TokenError::InvalidSignature
    ));
    assert!(matches!(
        token_error(h.service.refresh_access_token(&pair.refresh_token, now()).await),
        TokenError::InvalidSignature
    ));

    let new_pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();
    assert!(h
        .service
        .verify(&new_pair.access_token, TokenKind::Access, now())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_revoked_refresh_token_cannot_refresh() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let outcome = h.service.revoke(&pair.refresh_token, now()).await.unwrap();
    assert_eq!(outcome, RevokeOutcome::Revoked(TokenKind::Refresh));

    assert!(matches!(
        token_error(h.service.refresh_access_token(&pair.refresh_token, now()).await),
        TokenError::TokenRevoked
    ));

    let row = h
        .tokens
        .find_refresh_token(&hash_token(&pair.refresh_token))
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_revoked);
    assert!(h
        .tokens
        .is_token_blacklisted(&hash_token(&pair.refresh_token))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_ledger_revocation_alone_blocks_refresh() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    h.service.revoke_all_user_tokens(h.user.id).await.unwrap();

    assert!(matches!(
        token_error(h.service.refresh_access_token(&pair.refresh_token, now()).await),
        TokenError::TokenRevoked
    ));
}

#[tokio::test]
async fn test_ledger_expiry_is_independent_of_claims() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    h.tokens
        .set_token_expiry(&hash_token(&pair.refresh_token), now() - Duration::days(1))
        .await;

    assert!(h
        .service
        .verify(&pair.refresh_token, TokenKind::Refresh, now())
        .await
        .is_ok());
    assert!(matches!(
        token_error(h.service.refresh_access_token(&pair.refresh_token, now()).await),
        TokenError::RefreshTokenExpired
    ));
}

#[tokio::test]
async fn test_refresh_without_ledger_row() {
    let h = harness().await;
    let secret = h.engine.current_secret(now()).unwrap();
    let claims = Claims::new(
        h.user.id,
        &h.user.email,
        TokenKind::Refresh,
        now(),
        Duration::days(366),
    );
    let orphan = h.service.encode_jwt(&claims, &secret).unwrap();

    assert!(matches!(
        token_error(h.service.refresh_access_token(&orphan, now()).await),
        TokenError::RefreshTokenNotFound
    ));
}

#[tokio::test]
async fn test_refresh_uses_current_email_and_requires_user() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let mut renamed = h.user.clone();
    renamed.email = "renamed@example.com".to_string();
    h.users.update(renamed).await.unwrap();

    let fresh = h
        .service
        .refresh_access_token(&pair.refresh_token, now())
        .await
        .unwrap();
    let claims = h
        .service
        .verify(&fresh.token, TokenKind::Access, now())
        .await
        .unwrap();
    assert_eq!(claims.email, "renamed@example.com");

    h.users.delete(h.user.id).await.unwrap();
    assert!(matches!(
        h.service.refresh_access_token(&pair.refresh_token, now()).await,
        Err(DomainError::Auth(AuthError::UserNotFound))
    ));
}

#[tokio::test]
async fn test_wrong_kind() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    assert!(matches!(
        token_error(h.service.verify(&pair.refresh_token, TokenKind::Access, now()).await),
        TokenError::WrongTokenKind
    ));
    assert!(matches!(
        token_error(h.service.refresh_access_token(&pair.access_token, now()).await),
        TokenError::WrongTokenKind
    ));
}

#[tokio::test]
async fn test_garbage_token() {
    let h = harness().await;

    for garbage in ["", "not-a-jwt", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30"] {
        assert!(matches!(
            token_error(h.service.verify(garbage, TokenKind::Access, now()).await),
            TokenError::InvalidTokenFormat
        ));
    }
}

#[tokio::test]
async fn test_foreign_audience_rejected() {
    let h = harness().await;
    let secret = h.engine.current_secret(now()).unwrap();
    let claims = Claims::new(
        h.user.id,
        &h.user.email,
        TokenKind::Access,
        now(),
        Duration::minutes(15),
    )
    .with_audience("someone-else", "other-api");
    let foreign = h.service.encode_jwt(&claims, &secret).unwrap();

    assert!(matches!(
        token_error(h.service.verify(&foreign, TokenKind::Access, now()).await),
        TokenError::InvalidClaims
    ));
}

#[tokio::test]
async fn test_revoke_twice_and_blacklisted_access() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    assert_eq!(
        h.service.revoke(&pair.access_token, now()).await.unwrap(),
        RevokeOutcome::Revoked(TokenKind::Access)
    );
    assert_eq!(
        h.service.revoke(&pair.access_token, now()).await.unwrap(),
        RevokeOutcome::AlreadyRevoked
    );
    assert_eq!(h.tokens.blacklist_count().await, 1);

    assert!(matches!(
        token_error(h.service.verify(&pair.access_token, TokenKind::Access, now()).await),
        TokenError::TokenBlacklisted
    ));
    assert!(matches!(
        token_error(h.service.identify_user(&pair.access_token, now()).await),
        TokenError::TokenBlacklisted
    ));
}

#[tokio::test]
async fn test_revoke_ignores_expiry_but_not_signature() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let later = now() + Duration::hours(2);
    assert_eq!(
        h.service.revoke(&pair.access_token, later).await.unwrap(),
        RevokeOutcome::Revoked(TokenKind::Access)
    );

    assert!(matches!(
        token_error(h.service.revoke("garbage", now()).await),
        TokenError::InvalidTokenFormat
    ));
}

#[tokio::test]
async fn test_identify_user() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    let user = h.service.identify_user(&pair.access_token, now()).await.unwrap();
    assert_eq!(user.id, h.user.id);

    h.users.delete(h.user.id).await.unwrap();
    assert!(matches!(
        h.service.identify_user(&pair.access_token, now()).await,
        Err(DomainError::Auth(AuthError::UserNotFound))
    ));
}

#[tokio::test]
async fn test_ledger_write_failure_fails_issue() {
    let h = harness().await;
    h.tokens.set_fail_writes(true);

    assert!(matches!(
        token_error(h.service.issue_token_pair(&h.user, now()).await),
        TokenError::TokenGenerationFailed
    ));
    assert_eq!(h.tokens.token_count().await, 0);
}

#[tokio::test]
async fn test_shutdown_fails_closed() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();

    h.engine.shutdown();

    assert!(matches!(
        h.service.verify(&pair.access_token, TokenKind::Access, now()).await,
        Err(DomainError::Key(KeyError::Unavailable))
    ));
    assert!(matches!(
        h.service.issue_token_pair(&h.user, now()).await,
        Err(DomainError::Key(KeyError::Unavailable))
    ));
}

#[tokio::test]
async fn test_cleanup_expired() {
    let h = harness().await;
    let pair = h.service.issue_token_pair(&h.user, now()).await.unwrap();
    h.service.revoke(&pair.access_token, now()).await.unwrap();

    assert_eq!(h.service.cleanup_expired(now()).await.unwrap(), (0, 0));

    let later = now() + Duration::days(367);
    assert_eq!(h.service.cleanup_expired(later).await.unwrap(), (1, 1));
    assert_eq!(h.tokens.token_count().await, 0);
    assert_eq!(h.tokens.blacklist_count().await, 0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_key_generation_runs_off_the_runtime_thread() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Empty key directory: the first issuance generates an RSA key set
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(KeyRotationEngine::with_file_store(
        KeyRotationConfig::default().with_keys_dir(dir.path().join("keys")),
    ));
    let users = Arc::new(MockUserRepository::new());
    let user = User::new("u1@example.com", "u1", "hash", now());
    users.insert(user.clone()).await;
    let service = TokenService::new(
        Arc::new(MockTokenRepository::new()),
        users,
        Arc::clone(&engine),
        TokenServiceConfig::default(),
    );

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        })
    };

    let pair = service.issue_token_pair(&user, now()).await.unwrap();
    ticker.abort();

    assert!(ticks.load(Ordering::SeqCst) > 0);
    assert!(service
        .verify(&pair.access_token, TokenKind::Access, now())
        .await
        .is_ok());
}
