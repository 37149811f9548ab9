//! Bearer token authentication middleware for protecting API endpoints.
//!
//! The middleware extracts the access token from the Authorization header,
//! verifies it through the [`AccessTokenVerifier`] registered in app data
//! and injects an [`AuthContext`] into the request.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorUnauthorized, InternalError},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

use kw_core::{
    domain::entities::token::{Claims, TokenKind},
    errors::{AuthError, DomainError, TokenError},
    repositories::{TokenRepository, UserRepository},
    services::token::TokenService,
};

use crate::handlers::handle_domain_error;

/// Authenticated caller, injected into request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID from the `sub` claim
    pub user_id: Uuid,
    pub email: String,
    /// JWT ID for tracking
    pub jti: String,
    /// The verified access token, needed to revoke it on logout
    pub access_token: String,
}

impl AuthContext {
    /// Creates a new authentication context from verified claims
    pub fn from_claims(claims: Claims, access_token: String) -> Result<Self, DomainError> {
        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::InvalidClaims))?;
        Ok(Self {
            user_id,
            email: claims.email,
            jti: claims.jti,
            access_token,
        })
    }
}

/// Verification seam between the middleware and the token service
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    async fn verify_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DomainError>;
}

#[async_trait]
impl<R, U> AccessTokenVerifier for TokenService<R, U>
where
    R: TokenRepository + 'static,
    U: UserRepository + 'static,
{
    async fn verify_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DomainError> {
        self.verify(token, TokenKind::Access, now).await
    }
}

/// App data type under which the verifier is registered
pub type VerifierData = web::Data<Arc<dyn AccessTokenVerifier>>;

/// Bearer authentication middleware factory
#[derive(Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Bearer authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Some(token) => token,
                None => return Err(unauthorized(AuthError::AuthenticationRequired.into())),
            };

            let verifier = match req.app_data::<VerifierData>() {
                Some(verifier) => Arc::clone(verifier.get_ref()),
                None => {
                    log::error!("No access token verifier registered");
                    return Err(unauthorized(AuthError::AuthenticationRequired.into()));
                }
            };

            let auth_context = verifier
                .verify_access_token(&token, Utc::now())
                .await
                .and_then(|claims| AuthContext::from_claims(claims, token))
                .map_err(|e| {
                    log::debug!("Rejected bearer token on {}: {}", req.path(), e);
                    unauthorized(e)
                })?;

            req.extensions_mut().insert(auth_context);

            service.call(req).await
        })
    }
}

/// Error whose response body is the standard JSON error for `error`
fn unauthorized(error: DomainError) -> Error {
    let reason = error.to_string();
    InternalError::from_response(reason, handle_domain_error(error)).into()
}

/// Extracts Bearer token from Authorization header
pub fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}
