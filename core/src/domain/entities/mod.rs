//! Domain entities representing core business objects.

pub mod key_material;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use key_material::{
    DerivedSecret, KeyMaterial, KeyMetadata,
    DERIVED_SECRET_LEN, ENCRYPTION_KEY_LEN, KEY_METADATA_VERSION,
};
pub use token::{
    hash_token, AccessToken, BlacklistEntry, Claims, RefreshToken, RevokeOutcome, TokenKind,
    TokenPair, ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};
pub use user::{User, UserProfile};
