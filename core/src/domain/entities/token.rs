//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::sha256_hex;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (366 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 366;

/// JWT issuer
pub const JWT_ISSUER: &str = "keyward";

/// JWT audience
pub const JWT_AUDIENCE: &str = "keyward-api";

/// Hashes a raw token value for ledger and blacklist storage
///
/// Raw token values are never persisted; every lookup goes through this.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Which role a signed token plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Email of the subject at issue time
    pub email: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID, unique per issued token
    pub jti: String,

    /// Access or refresh
    pub token_type: TokenKind,
}

impl Claims {
    /// Creates claims for a token of `kind` issued at `now`
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's UUID
    /// * `email` - The user's email
    /// * `kind` - Access or refresh
    /// * `now` - Issue time
    /// * `lifetime` - How long the token stays valid
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        kind: TokenKind,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let expiry = now + lifetime;

        Self {
            sub: user_id.to_string(),
            email: email.into(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            iss: JWT_ISSUER.to_string(),
            aud: JWT_AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
            token_type: kind,
        }
    }

    /// Overrides issuer and audience
    pub fn with_audience(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self.aud = audience.into();
        self
    }

    /// A token is expired once `now` is strictly past its `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }

    /// Gets the expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Gets the user ID from the claims
    ///
    /// # Returns
    ///
    /// `Ok(Uuid)` if the subject can be parsed as a UUID, `Err` otherwise
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Refresh token ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier for the refresh token
    pub id: Uuid,

    /// User ID this token belongs to
    pub user_id: Uuid,

    /// SHA-256 of the signed token value
    pub token_hash: String,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked; never reset once set
    pub is_revoked: bool,
}

impl RefreshToken {
    /// Creates a new ledger row
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's UUID
    /// * `token_hash` - The hashed token value
    /// * `created_at` - Issue time
    /// * `expires_at` - Expiry copied from the token's claims
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            created_at,
            expires_at,
            is_revoked: false,
        }
    }

    /// Checks if the ledger row has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Checks if the refresh token is usable at `now`
    ///
    /// A token is valid if it hasn't expired and hasn't been revoked
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_revoked
    }

    /// Revokes the refresh token
    pub fn revoke(&mut self) {
        self.is_revoked = true;
    }
}

/// A token value that must never verify again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// SHA-256 of the signed token value
    pub token_hash: String,

    /// When the token was blacklisted
    pub blacklisted_at: DateTime<Utc>,

    /// The token's own expiry; the entry is garbage after this
    pub expires_at: DateTime<Utc>,
}

impl BlacklistEntry {
    pub fn new(token_hash: String, blacklisted_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash,
            blacklisted_at,
            expires_at,
        }
    }

    /// Whether the entry can be garbage collected at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Access token expiry time in seconds
    pub access_expires_in: i64,

    /// Refresh token expiry time in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_expires_in,
            refresh_expires_in,
        }
    }
}

/// A freshly minted access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Signed JWT
    pub token: String,

    /// Expiry of the token
    pub expires_at: DateTime<Utc>,

    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Result of a revoke call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The token was blacklisted by this call
    Revoked(TokenKind),
    /// The token was already blacklisted
    AlreadyRevoked,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let now = fixed_now();
        let claims = Claims::new(
            user_id,
            "alice@example.com",
            TokenKind::Access,
            now,
            Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES),
        );

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, JWT_ISSUER);
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_claims_expiry_boundary() {
        let now = fixed_now();
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@b.io",
            TokenKind::Access,
            now,
            Duration::minutes(15),
        );

        assert!(!claims.is_expired_at(now + Duration::minutes(15)));
        assert!(claims.is_expired_at(now + Duration::minutes(16)));
    }

    #[test]
    fn test_claims_have_unique_ids() {
        let now = fixed_now();
        let user_id = Uuid::new_v4();
        let a = Claims::new(user_id, "a@b.io", TokenKind::Refresh, now, Duration::days(1));
        let b = Claims::new(user_id, "a@b.io", TokenKind::Refresh, now, Duration::days(1));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_token_kind_serialization() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_refresh_token_revocation() {
        let now = fixed_now();
        let mut token = RefreshToken::new(
            Uuid::new_v4(),
            "hash".to_string(),
            now,
            now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
        );

        assert!(token.is_valid_at(now));

        token.revoke();

        assert!(token.is_revoked);
        assert!(!token.is_valid_at(now));
    }

    #[test]
    fn test_refresh_token_expiration() {
        let now = fixed_now();
        let token = RefreshToken::new(Uuid::new_v4(), "hash".to_string(), now, now + Duration::days(1));

        assert!(!token.is_expired_at(now + Duration::days(1)));
        assert!(token.is_expired_at(now + Duration::days(1) + Duration::seconds(1)));
        assert!(!token.is_valid_at(now + Duration::days(2)));
    }

    #[test]
    fn test_hash_token() {
        let hash1 = hash_token("jwt_token_value_1");
        let hash2 = hash_token("jwt_token_value_2");

        assert_eq!(hash1, hash_token("jwt_token_value_1"));
        assert_ne!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blacklist_entry_expiry() {
        let now = fixed_now();
        let entry = BlacklistEntry::new("hash".into(), now, now + Duration::minutes(15));
        assert!(!entry.is_expired_at(now + Duration::minutes(15)));
        assert!(entry.is_expired_at(now + Duration::minutes(16)));
    }
}
